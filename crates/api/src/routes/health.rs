use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Size of the worker pool.
    pub workers: usize,
    /// Runs waiting for a worker.
    pub queued: usize,
    /// Runs currently executing.
    pub in_flight: usize,
}

/// GET /health -- returns service, database, and worker pool health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = runlet_db::health_check(&state.pool).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        workers: state.dispatcher.workers(),
        queued: state.dispatcher.queued(),
        in_flight: state.dispatcher.in_flight(),
    })
}

/// Mount health check routes (root level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
