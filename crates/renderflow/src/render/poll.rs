use std::time::Duration;

use tracing::debug;

use crate::jobs::IntegrationConfig;
use crate::render::error::{RenderError, RenderResult};
use crate::render::{PollStatus, RenderProvider, RenderTicket};

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            attempts: 60,
        }
    }
}

/// Checks `ticket` until the provider reports a result, a failure, or
/// `cfg.attempts` checks have come back pending.
///
/// Returns the result URL. There is no sleep after the last check.
pub async fn poll_until_done(
    provider: &dyn RenderProvider,
    integration: &IntegrationConfig,
    ticket: &RenderTicket,
    cfg: &PollConfig,
) -> RenderResult<String> {
    for attempt in 1..=cfg.attempts {
        match provider.status(integration, ticket).await? {
            PollStatus::Completed(url) => return Ok(url),
            PollStatus::Failed(message) => return Err(RenderError::ProviderFailed(message)),
            PollStatus::Pending => {
                debug!(render_id = %ticket.id, attempt, "render still pending");
                if attempt < cfg.attempts {
                    tokio::time::sleep(cfg.interval).await;
                }
            }
        }
    }

    Err(RenderError::Timeout {
        attempts: cfg.attempts,
    })
}
