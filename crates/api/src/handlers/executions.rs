//! Handlers for execution records.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use runlet_core::types::DbId;
use runlet_db::models::execution::Execution;
use serde::Deserialize;

use crate::engine::dispatcher::Submitted;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /api/executions`.
#[derive(Debug, Deserialize)]
pub struct ExecutionListQuery {
    /// Only records of this script.
    pub script_id: Option<DbId>,
}

/// GET /api/executions?script_id=
///
/// Newest first.
pub async fn list_executions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ExecutionListQuery>,
) -> AppResult<Json<DataResponse<Vec<Execution>>>> {
    let executions = state.dispatcher.list(params.script_id).await?;
    Ok(Json(DataResponse { data: executions }))
}

/// GET /api/executions/{id}
pub async fn get_execution(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Execution>>> {
    let execution = state.dispatcher.get(id).await?;
    Ok(Json(DataResponse { data: execution }))
}

/// DELETE /api/executions/{id}
///
/// Allowed in any state. Does not stop a running process.
pub async fn delete_execution(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.dispatcher.delete(id).await?;
    tracing::info!(execution_id = id, "Execution deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/executions/{id}/rerun
///
/// Runs the same script again under a new execution id.
pub async fn rerun_execution(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<Submitted>>)> {
    let submitted = state.dispatcher.rerun(id).await?;
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: submitted })))
}
