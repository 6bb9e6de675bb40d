use std::time::Duration;

use crate::render::ApiShape;

/// Runtime configuration for the relay and the render worker.
///
/// Loaded from environment variables (and `.env` when present). Every
/// `RENDERFLOW_*` key also accepts its unprefixed name as a fallback.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: Option<String>,
    pub render_service: String,
    pub batch_size: i64,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
    pub api_shape: ApiShape,
    pub http_timeout: Option<Duration>,
    pub schedule_interval: Option<Duration>,
    pub relay_allowed_tables: Option<Vec<String>>,
    pub migrate_on_startup: bool,
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON lines; anything else is human-readable.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is missing"))?;

        let listen_addr = match env_or_fallback("RENDERFLOW_LISTEN_ADDR", "LISTEN_ADDR") {
            Some(v) => normalize_optional_addr(&v),
            None => Some("0.0.0.0:3000".to_string()),
        };

        let render_service = env_or_fallback("RENDERFLOW_RENDER_SERVICE", "RENDER_SERVICE")
            .unwrap_or_else(|| "heygen".to_string());

        let batch_size = env_or_fallback("RENDERFLOW_BATCH_SIZE", "BATCH_SIZE")
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(3)
            .clamp(1, 100);

        let poll_interval = env_or_fallback("RENDERFLOW_POLL_INTERVAL_MS", "POLL_INTERVAL_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(5));

        let poll_attempts = env_or_fallback("RENDERFLOW_POLL_ATTEMPTS", "POLL_ATTEMPTS")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(60)
            .max(1);

        let api_shape = match env_or_fallback("RENDERFLOW_API_SHAPE", "API_SHAPE") {
            Some(v) => ApiShape::parse(&v)
                .ok_or_else(|| anyhow::anyhow!("unknown RENDERFLOW_API_SHAPE: {v}"))?,
            None => ApiShape::V1,
        };

        let http_timeout = env_or_fallback("RENDERFLOW_HTTP_TIMEOUT_SECS", "HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let schedule_interval = env_or_fallback("RENDERFLOW_SCHEDULE_SECS", "SCHEDULE_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let relay_allowed_tables =
            env_or_fallback("RENDERFLOW_RELAY_TABLES", "RELAY_TABLES").map(|s| parse_list(&s));

        let migrate_on_startup = env_bool("RENDERFLOW_MIGRATE_ON_STARTUP").unwrap_or(false);

        let log_format = LogFormat::from_env();

        Ok(Self {
            database_url,
            listen_addr,
            render_service,
            batch_size,
            poll_interval,
            poll_attempts,
            api_shape,
            http_timeout,
            schedule_interval,
            relay_allowed_tables,
            migrate_on_startup,
            log_format,
        })
    }
}

fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn normalize_optional_addr(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if matches!(v.to_lowercase().as_str(), "0" | "off" | "false" | "none") {
        return None;
    }
    Some(v.to_string())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
