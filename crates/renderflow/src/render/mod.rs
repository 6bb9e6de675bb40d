//! Adapter for the external render provider.
//!
//! The worker talks to the provider only through [`RenderProvider`]: start a
//! render, then ask for its status. [`HeyGenClient`] is the HTTP
//! implementation; which request/response mapping it speaks is an [`ApiShape`].

pub mod error;
pub mod heygen;
pub mod payload;
pub mod poll;

pub use error::{RenderError, RenderResult};
pub use heygen::HeyGenClient;
pub use payload::{HookOverlay, RenderRequest};
pub use poll::{poll_until_done, PollConfig};

use std::{future::Future, pin::Pin};

use crate::jobs::IntegrationConfig;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque provider-side id of a started render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    Pending,
    Completed(String),
    Failed(String),
}

pub trait RenderProvider: Send + Sync {
    fn create<'a>(
        &'a self,
        integration: &'a IntegrationConfig,
        request: &'a RenderRequest,
    ) -> BoxFuture<'a, RenderResult<RenderTicket>>;

    fn status<'a>(
        &'a self,
        integration: &'a IntegrationConfig,
        ticket: &'a RenderTicket,
    ) -> BoxFuture<'a, RenderResult<PollStatus>>;
}

/// Request/response mapping spoken to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiShape {
    /// Flat payload on `/v1/video.generate`, retried on `/v1/videos/generate` after a 404.
    V1,
    /// `video_inputs` payload on `/v2/video/generate`.
    V2,
}

impl ApiShape {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "v1" => Some(Self::V1),
            "v2" => Some(Self::V2),
            _ => None,
        }
    }

    pub fn create_path(&self) -> &'static str {
        match self {
            Self::V1 => "/v1/video.generate",
            Self::V2 => "/v2/video/generate",
        }
    }

    pub fn fallback_create_path(&self) -> Option<&'static str> {
        match self {
            Self::V1 => Some("/v1/videos/generate"),
            Self::V2 => None,
        }
    }

    pub fn status_path(&self) -> &'static str {
        match self {
            Self::V1 => "/v1/video.status",
            Self::V2 => "/v1/video_status.get",
        }
    }
}
