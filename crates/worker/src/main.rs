use renderflow::api;
use renderflow::config;
use renderflow::db;
use renderflow::jobs::{RenderWorker, VideosRepo, WorkerSettings};
use renderflow::relay::{IdentifierPolicy, QueryRelay};
use renderflow::render::HeyGenClient;
use renderflow::telemetry;

use std::sync::Arc;
use tracing::info;

mod schedule;
use schedule::Schedule;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::Config::from_env()?;
    telemetry::init_tracing(cfg.log_format)?;

    let api_addr = cfg.listen_addr.clone();
    info!(
        service = %cfg.render_service,
        batch_size = cfg.batch_size,
        poll_interval_ms = cfg.poll_interval.as_millis() as u64,
        poll_attempts = cfg.poll_attempts,
        api_shape = ?cfg.api_shape,
        api = %api_addr.clone().unwrap_or_else(|| "disabled".to_string()),
        schedule = ?cfg.schedule_interval,
        relay_tables = ?cfg.relay_allowed_tables,
        migrate_on_startup = cfg.migrate_on_startup,
        "render-worker starting"
    );

    if api_addr.is_none() && cfg.schedule_interval.is_none() {
        anyhow::bail!("neither RENDERFLOW_LISTEN_ADDR nor RENDERFLOW_SCHEDULE_SECS is set");
    }

    let pool = db::make_pool(&cfg.database_url).await?;
    if cfg.migrate_on_startup {
        db::run_migrations(&pool).await?;
    }

    let relay = QueryRelay::new(
        pool.clone(),
        IdentifierPolicy::from_config(cfg.relay_allowed_tables.as_deref()),
    );
    let client = HeyGenClient::new(cfg.api_shape, cfg.http_timeout)?;
    let worker = RenderWorker::new(
        VideosRepo::new(pool.clone()),
        Arc::new(client),
        WorkerSettings::from_config(&cfg),
    );

    // ---- API task ----
    let app = api::router(api::ApiState {
        relay,
        worker: worker.clone(),
    });

    let api_handle = tokio::spawn(async move {
        if let Some(addr) = api_addr {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("api listening on http://{addr}");
            axum::serve(listener, app).await?;
        } else {
            std::future::pending::<()>().await;
        }
        Ok::<(), anyhow::Error>(())
    });

    // ---- Scheduled worker task ----
    let schedule_interval = cfg.schedule_interval;
    let schedule_handle = tokio::spawn(async move {
        match schedule_interval {
            Some(interval) => Schedule::new(worker, interval).run().await,
            None => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    });

    tokio::select! {
        res = api_handle => res??,
        res = schedule_handle => res??,
    }

    Ok(())
}
