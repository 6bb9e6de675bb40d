use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One render job, a row of `videos`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Video {
    pub id: i64,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,

    pub script: Option<String>,
    pub hook: Option<String>,
    pub captions_on: Option<bool>,
    pub hook_overlay_on: Option<bool>,
    pub hook_pos: Option<String>,

    pub render_service: Option<String>,
    pub render_id: Option<String>,
    pub file_url: Option<String>,
    /// Holds the failure message once a render ends in ERROR.
    pub link: Option<String>,
    pub claim_token: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn status(&self) -> Option<VideoStatus> {
        VideoStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewVideo {
    pub status: Option<VideoStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub script: Option<String>,
    pub hook: Option<String>,
    pub captions_on: Option<bool>,
    pub hook_overlay_on: Option<bool>,
    pub hook_pos: Option<String>,
    pub render_service: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatus {
    Init,
    Queued,
    Rendering,
    Ready,
    Error,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Init => "INIT",
            VideoStatus::Queued => "QUEUED",
            VideoStatus::Rendering => "RENDERING",
            VideoStatus::Ready => "READY",
            VideoStatus::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INIT" => Some(Self::Init),
            "QUEUED" => Some(Self::Queued),
            "RENDERING" => Some(Self::Rendering),
            "READY" => Some(Self::Ready),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Stored credentials for one render provider, a row of `integrations`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Integration {
    pub id: Uuid,
    pub service: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub presenter_id: Option<String>,
    pub voice_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
