use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{RelayResponse, WorkerResponse};
use crate::jobs::RenderWorker;
use crate::relay::{QueryRelay, RelayRequest};

pub mod error;
pub mod models;

#[derive(Clone)]
pub struct ApiState {
    pub relay: QueryRelay,
    pub worker: RenderWorker,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/api/db",
            post(relay).fallback(|| async { ApiError::MethodNotAllowed("Only POST allowed") }),
        )
        .route(
            "/api/worker",
            get(run_worker)
                .post(run_worker)
                .fallback(|| async { ApiError::MethodNotAllowed("Use GET/POST") }),
        )
        .route("/health", get(health))
        .with_state(state)
}

/// An empty body reads as `{}`, which then fails as a missing table.
fn parse_relay_request(body: &[u8]) -> ApiResult<RelayRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RelayRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON: {e}")))
}

pub async fn relay(
    State(state): State<ApiState>,
    body: Bytes,
) -> ApiResult<Json<RelayResponse>> {
    let req = parse_relay_request(&body)?;
    let outcome = state.relay.execute(&req).await?;
    Ok(Json(outcome.into()))
}

/// The run is spawned so that a client hanging up does not cancel it
/// between jobs.
pub async fn run_worker(State(state): State<ApiState>) -> ApiResult<Json<WorkerResponse>> {
    let worker = state.worker.clone();
    let report = tokio::spawn(async move { worker.run_once().await })
        .await
        .map_err(anyhow::Error::from)??;
    info!(
        claimed = report.claimed,
        processed = report.processed,
        failed = report.failed,
        "worker triggered over http"
    );

    Ok(Json(WorkerResponse {
        ok: true,
        processed: report.processed,
    }))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_an_empty_request() {
        let req = parse_relay_request(b"  \n").unwrap();
        assert!(req.table.is_none());
        assert!(req.action.is_none());
    }

    #[test]
    fn malformed_body_is_a_bad_request() {
        let err = parse_relay_request(b"{not json").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m.starts_with("Invalid JSON")));
    }

    #[test]
    fn where_key_maps_to_filter() {
        let req =
            parse_relay_request(br#"{"action":"select","table":"videos","where":{"id":5}}"#)
                .unwrap();
        assert_eq!(req.table.as_deref(), Some("videos"));
        assert_eq!(req.filter.unwrap()["id"], serde_json::json!(5));
    }
}
