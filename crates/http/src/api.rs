//! HTTP handlers for the ranker endpoints.
//!
//! `GET /health` is a bare liveness probe; `POST /rank` validates the strict
//! request schema, runs the ranking pipeline, and reports wall-clock latency
//! in an `X-Ranker-Latency-ms` header. Schema violations are rejected before
//! the core is invoked; abstentions come back as 200s because declining to
//! recommend is a normal outcome.

use axum::{
    extract::Json,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::time::Instant;
use tracing::debug;

use pemrank_core::{rank, RankRequest};

static LATENCY_HEADER: HeaderName = HeaderName::from_static("x-ranker-latency-ms");

/// Build the ranker's route table. The service is stateless, so the router
/// carries no shared state.
pub fn router() -> Router {
    Router::new().route("/health", get(api_health)).route("/rank", post(api_rank))
}

/// Liveness probe.
pub async fn api_health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Rank a candidate pool against the query PEM.
pub async fn api_rank(Json(req): Json<RankRequest>) -> Response {
    let start = Instant::now();

    if let Err(err) = req.validate() {
        debug!(error = %err, "rejecting rank request");
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
            .into_response();
    }

    // CPU-bound; keep it off the async worker threads.
    let out = tokio::task::spawn_blocking(move || rank(&req))
        .await
        .expect("ranking task panicked");

    let latency_ms = start.elapsed().as_millis() as u64;
    let mut response = Json(out).into_response();
    response.headers_mut().insert(LATENCY_HEADER.clone(), HeaderValue::from(latency_ms));
    response
}
