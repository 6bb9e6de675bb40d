use std::env;
use std::sync::Arc;

use renderflow::config::{Config, LogFormat};
use renderflow::db;
use renderflow::jobs::{
    IntegrationsRepo, NewIntegration, NewVideo, RenderWorker, VideoStatus, VideosRepo,
    WorkerSettings,
};
use renderflow::render::HeyGenClient;
use renderflow::telemetry;
use sqlx::PgPool;

const USAGE: &str = "renderctl <command>\n\
     Commands:\n\
     - migrate\n\
     - reset\n\
     - seed <n>\n\
     - integration <api_key> [base_url]\n\
     - status\n\
     - run-once\n\
     \n\
     Uses DATABASE_URL or TEST_DATABASE_URL.\n";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing(LogFormat::from_env())?;

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let url = env::var("DATABASE_URL")
        .or_else(|_| env::var("TEST_DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("DATABASE_URL or TEST_DATABASE_URL must be set"))?;
    let pool = db::make_pool(&url).await?;

    match command.as_str() {
        "migrate" => {
            db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
        "reset" => reset(&pool).await?,
        "seed" => {
            let n: i64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(3);
            seed(&pool, n).await?;
        }
        "integration" => {
            let Some(api_key) = args.get(2) else {
                anyhow::bail!("usage: renderctl integration <api_key> [base_url]");
            };
            let id = IntegrationsRepo::new(pool.clone())
                .insert(NewIntegration {
                    service: "heygen".to_string(),
                    api_key: api_key.clone(),
                    base_url: args.get(3).cloned(),
                    ..NewIntegration::default()
                })
                .await?;
            println!("+ inserted heygen integration id={id}");
        }
        "status" => show_counts(&pool).await?,
        "run-once" => run_once(pool).await?,
        other => {
            eprintln!("Unknown command: {other}\n\n{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn reset(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("TRUNCATE TABLE videos RESTART IDENTITY")
        .execute(pool)
        .await?;

    println!("reset OK");
    Ok(())
}

async fn seed(pool: &PgPool, n: i64) -> anyhow::Result<()> {
    let videos = VideosRepo::new(pool.clone());
    for i in 0..n {
        let id = videos
            .enqueue(NewVideo {
                status: Some(VideoStatus::Queued),
                script: Some(format!("Demo script number {}", i + 1)),
                hook: Some("Watch this".to_string()),
                render_service: Some("heygen".to_string()),
                ..NewVideo::default()
            })
            .await?;

        println!("+ queued video id={id}");
    }
    Ok(())
}

async fn show_counts(pool: &PgPool) -> anyhow::Result<()> {
    let counts = VideosRepo::new(pool.clone()).count_by_status().await?;
    if counts.is_empty() {
        println!("videos: none");
        return Ok(());
    }

    let line = counts
        .iter()
        .map(|(status, n)| format!("{}={}", status.to_lowercase(), n))
        .collect::<Vec<_>>()
        .join(" ");
    println!("videos: {line}");
    Ok(())
}

async fn run_once(pool: PgPool) -> anyhow::Result<()> {
    let cfg = Config::from_env()?;
    let client = HeyGenClient::new(cfg.api_shape, cfg.http_timeout)?;
    let worker = RenderWorker::new(
        VideosRepo::new(pool),
        Arc::new(client),
        WorkerSettings::from_config(&cfg),
    );

    let report = worker.run_once().await?;
    println!(
        "run-once: claimed={} processed={} failed={}",
        report.claimed, report.processed, report.failed
    );
    Ok(())
}
