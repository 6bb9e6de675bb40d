use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::jobs::integrations::{IntegrationConfig, IntegrationsRepo};
use crate::jobs::model::Video;
use crate::jobs::repo::VideosRepo;
use crate::render::{poll_until_done, PollConfig, RenderError, RenderProvider, RenderRequest};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("no {service} integration found")]
    IntegrationMissing { service: String },
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Matched against `videos.render_service` and `integrations.service`.
    pub service: String,
    pub batch_size: i64,
    pub poll: PollConfig,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            service: "heygen".to_string(),
            batch_size: 3,
            poll: PollConfig::default(),
        }
    }
}

impl WorkerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            service: cfg.render_service.clone(),
            batch_size: cfg.batch_size,
            poll: PollConfig {
                interval: cfg.poll_interval,
                attempts: cfg.poll_attempts,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub claimed: usize,
    /// Jobs that reached READY.
    pub processed: usize,
    pub failed: usize,
}

struct RenderFailure {
    error: RenderError,
    render_id: Option<String>,
}

#[derive(Clone)]
pub struct RenderWorker {
    videos: VideosRepo,
    integrations: IntegrationsRepo,
    provider: Arc<dyn RenderProvider>,
    settings: WorkerSettings,
}

impl RenderWorker {
    pub fn new(
        videos: VideosRepo,
        provider: Arc<dyn RenderProvider>,
        settings: WorkerSettings,
    ) -> Self {
        let integrations = IntegrationsRepo::new(videos.pool().clone());
        Self {
            videos,
            integrations,
            provider,
            settings,
        }
    }

    /// One invocation: claim up to `batch_size` jobs one at a time, render
    /// each, record its terminal state. A failing job never stops the batch.
    pub async fn run_once(&self) -> anyhow::Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("render_run", %run_id, service = %self.settings.service);
        self.run_claimed(run_id).instrument(span).await
    }

    async fn run_claimed(&self, token: Uuid) -> anyhow::Result<RunReport> {
        let mut report = RunReport::default();
        let Some(integration) = self.integration().await? else {
            return Ok(report);
        };

        // A job is claimed only when its turn comes: if this future is
        // dropped, jobs not yet reached stay pending for the next run.
        while (report.claimed as i64) < self.settings.batch_size {
            let Some(video) = self
                .videos
                .claim_next(&self.settings.service, Utc::now(), token)
                .await?
            else {
                break;
            };
            report.claimed += 1;

            if self.process(&integration, token, &video).await? {
                report.processed += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            claimed = report.claimed,
            processed = report.processed,
            failed = report.failed,
            "render run finished"
        );
        Ok(report)
    }

    /// Credentials for this run, or `None` when no job is waiting.
    ///
    /// Credentials are looked up only when there is work, and a missing
    /// integration fails the run before any job is touched.
    pub async fn integration(&self) -> anyhow::Result<Option<IntegrationConfig>> {
        let service = self.settings.service.as_str();
        if !self.videos.has_pending(service, Utc::now()).await? {
            return Ok(None);
        }

        let Some(row) = self.integrations.latest_for(service).await? else {
            return Err(WorkerError::IntegrationMissing {
                service: service.to_string(),
            }
            .into());
        };

        Ok(Some(IntegrationConfig::from_row(&row)))
    }

    /// Renders one claimed job and writes READY or ERROR.
    /// Returns true when the job ended READY.
    async fn process(
        &self,
        integration: &IntegrationConfig,
        token: Uuid,
        video: &Video,
    ) -> anyhow::Result<bool> {
        let (message, render_id) = match self.render(integration, video).await {
            Ok((render_id, file_url)) => {
                match self
                    .videos
                    .mark_ready(video.id, token, &file_url, &render_id)
                    .await
                {
                    Ok(true) => {
                        info!(video_id = video.id, %render_id, "render ready");
                        return Ok(true);
                    }
                    Ok(false) => {
                        warn!(video_id = video.id, "job left RENDERING before it could be marked READY");
                        return Ok(false);
                    }
                    Err(e) => {
                        warn!(video_id = video.id, error = %e, "could not record finished render");
                        (format!("failed to record render result: {e}"), Some(render_id))
                    }
                }
            }
            Err(failure) => {
                let message = failure.error.to_string();
                warn!(video_id = video.id, error = %message, "render failed");
                (message, failure.render_id)
            }
        };

        self.videos
            .mark_error(video.id, token, &message, render_id.as_deref())
            .await?;
        Ok(false)
    }

    /// Returns `(render_id, file_url)`.
    async fn render(
        &self,
        integration: &IntegrationConfig,
        video: &Video,
    ) -> Result<(String, String), RenderFailure> {
        let request = RenderRequest::from_job(video, integration);

        let ticket = self
            .provider
            .create(integration, &request)
            .await
            .map_err(|error| RenderFailure {
                error,
                render_id: None,
            })?;

        let url = poll_until_done(
            self.provider.as_ref(),
            integration,
            &ticket,
            &self.settings.poll,
        )
        .await
        .map_err(|error| RenderFailure {
            error,
            render_id: Some(ticket.id.clone()),
        })?;

        Ok((ticket.id, url))
    }
}
