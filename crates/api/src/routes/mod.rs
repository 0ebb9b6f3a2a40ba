pub mod auth;
pub mod executions;
pub mod health;
pub mod scripts;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/change-password                            change password
///
/// /scripts                                         list, create
/// /scripts/{id}                                    get, update, delete
/// /scripts/{id}/run                                submit a run (POST)
///
/// /executions                                      list (?script_id=)
/// /executions/{id}                                 get, delete
/// /executions/{id}/rerun                           submit again (POST)
/// ```
///
/// Everything except login requires a Bearer token. Unknown paths under
/// `/api` answer with a JSON 404 instead of the frontend.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/scripts", scripts::router())
        .nest("/executions", executions::router())
        .fallback(api_not_found)
}

async fn api_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "No such API endpoint",
            "code": "NOT_FOUND",
        })),
    )
}
