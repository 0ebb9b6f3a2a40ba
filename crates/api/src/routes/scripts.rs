//! Route definitions for script endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::scripts;
use crate::state::AppState;

/// Routes mounted at `/scripts`.
///
/// ```text
/// POST   /            -> create_script
/// GET    /            -> list_scripts
/// GET    /{id}        -> get_script
/// PUT    /{id}        -> update_script
/// DELETE /{id}        -> delete_script
/// POST   /{id}/run    -> run_script
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(scripts::list_scripts).post(scripts::create_script),
        )
        .route(
            "/{id}",
            get(scripts::get_script)
                .put(scripts::update_script)
                .delete(scripts::delete_script),
        )
        .route("/{id}/run", post(scripts::run_script))
}
