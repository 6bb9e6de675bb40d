#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use renderflow::jobs::{
    IntegrationConfig, IntegrationsRepo, NewIntegration, NewVideo, RenderWorker, VideoStatus,
    VideosRepo, WorkerSettings,
};
use renderflow::render::{
    BoxFuture, PollConfig, PollStatus, RenderError, RenderProvider, RenderRequest, RenderResult,
    RenderTicket,
};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Fresh, migrated and emptied database, or `None` when
/// `TEST_DATABASE_URL` is not set.
pub async fn setup_db() -> Option<PgPool> {
    let _ = dotenvy::dotenv();

    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL missing, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations failed");

    sqlx::query("TRUNCATE TABLE videos, integrations RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("truncate failed");

    Some(pool)
}

pub async fn insert_integration(pool: &PgPool, service: &str) {
    IntegrationsRepo::new(pool.clone())
        .insert(NewIntegration {
            service: service.to_string(),
            api_key: "test-key".to_string(),
            presenter_id: Some("avatar-1".to_string()),
            ..NewIntegration::default()
        })
        .await
        .expect("failed to insert integration");
}

pub async fn insert_video(
    pool: &PgPool,
    status: VideoStatus,
    scheduled_in_secs: Option<i64>,
    service: Option<&str>,
    script: &str,
) -> i64 {
    VideosRepo::new(pool.clone())
        .enqueue(NewVideo {
            status: Some(status),
            scheduled_at: scheduled_in_secs.map(|s| Utc::now() + ChronoDuration::seconds(s)),
            script: Some(script.to_string()),
            render_service: service.map(str::to_string),
            ..NewVideo::default()
        })
        .await
        .expect("failed to insert video")
}

pub fn fast_settings(batch_size: i64) -> WorkerSettings {
    WorkerSettings {
        service: "heygen".to_string(),
        batch_size,
        poll: PollConfig {
            interval: Duration::from_millis(1),
            attempts: 3,
        },
    }
}

pub fn worker(pool: &PgPool, provider: Arc<FakeProvider>, batch_size: i64) -> RenderWorker {
    RenderWorker::new(
        VideosRepo::new(pool.clone()),
        provider,
        fast_settings(batch_size),
    )
}

/// Worker whose stalled renders take about `interval * attempts` to time out.
pub fn slow_worker(
    pool: &PgPool,
    provider: Arc<FakeProvider>,
    interval: Duration,
    attempts: u32,
) -> RenderWorker {
    RenderWorker::new(
        VideosRepo::new(pool.clone()),
        provider,
        WorkerSettings {
            poll: PollConfig { interval, attempts },
            ..fast_settings(3)
        },
    )
}

/// In-memory provider whose behaviour follows the script text:
/// "reject" fails the create call, "fail" fails on the first status check,
/// "stall" never finishes, "nul" completes with a URL Postgres cannot store,
/// anything else completes at once.
#[derive(Default)]
pub struct FakeProvider {
    next_id: AtomicU32,
    tickets: Mutex<HashMap<String, String>>,
    created: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script texts of every accepted create call, in order.
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn result_url(ticket_id: &str) -> String {
        format!("https://cdn.test/{ticket_id}.mp4")
    }
}

impl RenderProvider for FakeProvider {
    fn create<'a>(
        &'a self,
        _integration: &'a IntegrationConfig,
        request: &'a RenderRequest,
    ) -> BoxFuture<'a, RenderResult<RenderTicket>> {
        Box::pin(async move {
            if request.text.contains("reject") {
                return Err(RenderError::CreateFailed {
                    status: 400,
                    body: "bad avatar".to_string(),
                });
            }

            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let id = format!("r-{n}");
            self.tickets
                .lock()
                .unwrap()
                .insert(id.clone(), request.text.clone());
            self.created.lock().unwrap().push(request.text.clone());
            Ok(RenderTicket { id })
        })
    }

    fn status<'a>(
        &'a self,
        _integration: &'a IntegrationConfig,
        ticket: &'a RenderTicket,
    ) -> BoxFuture<'a, RenderResult<PollStatus>> {
        Box::pin(async move {
            let text = self
                .tickets
                .lock()
                .unwrap()
                .get(&ticket.id)
                .cloned()
                .unwrap_or_default();

            let status = if text.contains("nul") {
                PollStatus::Completed(format!("https://cdn.test/{}\0.mp4", ticket.id))
            } else if text.contains("fail") {
                PollStatus::Failed("avatar not found".to_string())
            } else if text.contains("stall") {
                PollStatus::Pending
            } else {
                PollStatus::Completed(Self::result_url(&ticket.id))
            };
            Ok(status)
        })
    }
}
