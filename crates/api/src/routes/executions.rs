use axum::routing::{get, post};
use axum::Router;

use crate::handlers::executions;
use crate::state::AppState;

/// Routes mounted at `/executions`.
///
/// ```text
/// GET    /              -> list_executions
/// GET    /{id}          -> get_execution
/// DELETE /{id}          -> delete_execution
/// POST   /{id}/rerun    -> rerun_execution
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(executions::list_executions))
        .route(
            "/{id}",
            get(executions::get_execution).delete(executions::delete_execution),
        )
        .route("/{id}/rerun", post(executions::rerun_execution))
}
