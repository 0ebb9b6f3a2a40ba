//! Execution record model and DTOs.

use chrono::Utc;
use runlet_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// One attempt to run a script.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Execution {
    pub id: DbId,
    pub script_id: DbId,
    /// Script name at submission time.
    pub script_name: String,
    /// Human-readable label, see [`execution_name`].
    pub name: String,
    /// One of `running`, `success`, `failed`.
    pub status: String,
    /// Combined stdout and stderr. Empty while running.
    pub output: String,
    pub error_message: Option<String>,
    pub exit_code: Option<i32>,
    pub duration_ms: Option<i64>,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new execution record.
#[derive(Debug, Clone)]
pub struct CreateExecution {
    pub script_id: DbId,
    pub script_name: String,
    pub name: String,
}

impl CreateExecution {
    /// Build the insert DTO for a run of the given script starting now.
    pub fn for_script(script_id: DbId, script_name: &str, script_type: &str) -> Self {
        Self {
            script_id,
            script_name: script_name.to_string(),
            name: execution_name(script_type, script_id, script_name, Utc::now()),
        }
    }
}

/// Label of the form `{type}_{script_id}_{script_name}_{YYYYmmdd_HHMMSS}` (UTC).
pub fn execution_name(
    script_type: &str,
    script_id: DbId,
    script_name: &str,
    at: Timestamp,
) -> String {
    format!(
        "{script_type}_{script_id}_{script_name}_{}",
        at.format("%Y%m%d_%H%M%S")
    )
}
