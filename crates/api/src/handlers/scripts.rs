//! Handlers for script registration and on-demand runs.
//!
//! All endpoints require authentication.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use runlet_core::error::{require_non_blank, CoreError};
use runlet_core::types::DbId;
use runlet_db::models::script::{CreateScript, Script, UpdateScript};
use runlet_db::repositories::ScriptRepo;

use crate::engine::dispatcher::Submitted;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/scripts
///
/// Register a new script. The type is not checked here; an unknown type
/// fails when the script is run.
pub async fn create_script(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateScript>,
) -> AppResult<(StatusCode, Json<DataResponse<Script>>)> {
    require_non_blank("name", &input.name)?;
    require_non_blank("script_type", &input.script_type)?;
    require_non_blank("content", &input.content)?;

    let script = ScriptRepo::create(&state.pool, &input).await?;

    tracing::info!(
        script_id = script.id,
        script_type = %script.script_type,
        user_id = auth.user_id,
        "Script registered"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: script })))
}

/// GET /api/scripts
pub async fn list_scripts(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Script>>>> {
    let scripts = ScriptRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: scripts }))
}

/// GET /api/scripts/{id}
pub async fn get_script(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Script>>> {
    let script = ScriptRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| script_not_found(id))?;

    Ok(Json(DataResponse { data: script }))
}

/// PUT /api/scripts/{id}
///
/// Only supplied fields change. Runs already queued keep the old content.
pub async fn update_script(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateScript>,
) -> AppResult<Json<DataResponse<Script>>> {
    for (field, value) in [
        ("name", &input.name),
        ("script_type", &input.script_type),
        ("content", &input.content),
    ] {
        if let Some(value) = value {
            require_non_blank(field, value)?;
        }
    }

    let script = ScriptRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| script_not_found(id))?;

    tracing::info!(script_id = id, "Script updated");
    Ok(Json(DataResponse { data: script }))
}

/// DELETE /api/scripts/{id}
///
/// Soft delete. Execution records of the script are kept.
pub async fn delete_script(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ScriptRepo::soft_delete(&state.pool, id).await? {
        return Err(script_not_found(id));
    }
    tracing::info!(script_id = id, "Script deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/scripts/{id}/run
///
/// Returns 202 with the new execution id as soon as the record exists.
pub async fn run_script(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<Submitted>>)> {
    let submitted = state.dispatcher.submit(id).await?;
    tracing::debug!(
        script_id = id,
        execution_id = submitted.execution_id,
        user_id = auth.user_id,
        "Run requested"
    );
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: submitted })))
}

fn script_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "script",
        id,
    })
}
