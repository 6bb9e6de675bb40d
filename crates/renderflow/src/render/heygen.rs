//! HTTP client for the HeyGen render API.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::jobs::IntegrationConfig;
use crate::render::error::{RenderError, RenderResult};
use crate::render::payload::{create_body, extract_job_id, interpret_status};
use crate::render::{ApiShape, BoxFuture, PollStatus, RenderProvider, RenderRequest, RenderTicket};

const API_KEY_HEADER: &str = "X-Api-Key";

pub struct HeyGenClient {
    http: Client,
    shape: ApiShape,
}

impl HeyGenClient {
    /// `timeout` of `None` leaves request timeouts to the transport defaults.
    pub fn new(shape: ApiShape, timeout: Option<Duration>) -> RenderResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(RenderError::Network)?;

        Ok(Self { http, shape })
    }

    async fn post_create(
        &self,
        integration: &IntegrationConfig,
        path: &str,
        request: &RenderRequest,
    ) -> RenderResult<Response> {
        let url = format!("{}{}", integration.base_url, path);
        debug!("starting render at {}", url);

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &integration.api_key)
            .json(&create_body(self.shape, request))
            .send()
            .await?;
        Ok(response)
    }

    async fn start(
        &self,
        integration: &IntegrationConfig,
        request: &RenderRequest,
    ) -> RenderResult<RenderTicket> {
        let mut response = self
            .post_create(integration, self.shape.create_path(), request)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            if let Some(fallback) = self.shape.fallback_create_path() {
                warn!(
                    "render create endpoint {} returned 404, retrying at {}",
                    self.shape.create_path(),
                    fallback
                );
                response = self.post_create(integration, fallback, request).await?;
            }
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::CreateFailed { status, body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RenderError::InvalidResponse(e.to_string()))?;

        let id = extract_job_id(&body).ok_or(RenderError::MissingJobId)?;
        Ok(RenderTicket { id })
    }

    async fn check(
        &self,
        integration: &IntegrationConfig,
        ticket: &RenderTicket,
    ) -> RenderResult<PollStatus> {
        let url = format!("{}{}", integration.base_url, self.shape.status_path());

        let response = self
            .http
            .get(&url)
            .query(&[("video_id", ticket.id.as_str())])
            .header(API_KEY_HEADER, &integration.api_key)
            .send()
            .await?;

        // an unreadable body is treated like "not done yet"
        let text = response.text().await?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
        Ok(interpret_status(&body))
    }
}

impl RenderProvider for HeyGenClient {
    fn create<'a>(
        &'a self,
        integration: &'a IntegrationConfig,
        request: &'a RenderRequest,
    ) -> BoxFuture<'a, RenderResult<RenderTicket>> {
        Box::pin(self.start(integration, request))
    }

    fn status<'a>(
        &'a self,
        integration: &'a IntegrationConfig,
        ticket: &'a RenderTicket,
    ) -> BoxFuture<'a, RenderResult<PollStatus>> {
        Box::pin(self.check(integration, ticket))
    }
}
