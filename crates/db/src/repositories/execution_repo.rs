//! Repository for the `executions` table.
//!
//! A record is inserted as `running` and finished exactly once. Reads hide
//! soft-deleted records; [`ExecutionRepo::finish`] does not, so a worker can
//! still close out a record that was deleted while it ran.

use chrono::Utc;
use runlet_core::scripting::outcome::ExecutionOutcome;
use runlet_core::scripting::status::{ExecutionStatus, EXECUTION_FAILED, EXECUTION_RUNNING};
use runlet_core::types::DbId;

use crate::models::execution::{CreateExecution, Execution};
use crate::DbPool;

/// Column list for `executions` SELECT queries.
const COLUMNS: &str = "\
    id, script_id, script_name, name, status, output, error_message, \
    exit_code, duration_ms, start_time, end_time, created_at, updated_at";

/// Provides persistence for execution records.
pub struct ExecutionRepo;

impl ExecutionRepo {
    /// Insert a record in the `running` state with `start_time = now`.
    pub async fn create(pool: &DbPool, dto: &CreateExecution) -> Result<Execution, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO executions \
                (script_id, script_name, name, status, output, start_time, created_at, updated_at) \
             VALUES (?, ?, ?, ?, '', ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Execution>(&query)
            .bind(dto.script_id)
            .bind(&dto.script_name)
            .bind(&dto.name)
            .bind(EXECUTION_RUNNING)
            .bind(now)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Move a `running` record to its terminal state.
    ///
    /// Returns `false` if the record does not exist or already left
    /// `running`; the stored terminal state is never overwritten.
    pub async fn finish(
        pool: &DbPool,
        id: DbId,
        outcome: &ExecutionOutcome,
    ) -> Result<bool, sqlx::Error> {
        debug_assert!(
            ExecutionStatus::Running.can_transition_to(outcome.status),
            "finish called with non-terminal status {}",
            outcome.status
        );
        let now = Utc::now();
        let rows = sqlx::query(
            "UPDATE executions SET \
                status = ?, output = ?, error_message = ?, exit_code = ?, \
                duration_ms = ?, end_time = ?, updated_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(outcome.status.as_str())
        .bind(&outcome.output)
        .bind(&outcome.error_message)
        .bind(outcome.exit_code)
        .bind(outcome.duration_ms)
        .bind(now)
        .bind(now)
        .bind(id)
        .bind(EXECUTION_RUNNING)
        .execute(pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    /// Find a live execution record by ID.
    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Execution>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM executions WHERE id = ? AND deleted_at IS NULL");
        sqlx::query_as::<_, Execution>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List live execution records, newest first, optionally for one script.
    pub async fn list(
        pool: &DbPool,
        script_id: Option<DbId>,
    ) -> Result<Vec<Execution>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM executions \
             WHERE deleted_at IS NULL AND (? IS NULL OR script_id = ?) \
             ORDER BY id DESC"
        );
        sqlx::query_as::<_, Execution>(&query)
            .bind(script_id)
            .bind(script_id)
            .fetch_all(pool)
            .await
    }

    /// Soft-delete a record in any state. Does not stop a running process.
    pub async fn soft_delete(pool: &DbPool, id: DbId) -> Result<bool, sqlx::Error> {
        let now = Utc::now();
        let rows = sqlx::query(
            "UPDATE executions SET deleted_at = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    /// Fail every record still `running`, including soft-deleted ones.
    ///
    /// Called once at startup, before any worker exists, to close out
    /// records whose process died with the previous server. Returns the
    /// number of records changed.
    pub async fn fail_abandoned(pool: &DbPool, detail: &str) -> Result<u64, sqlx::Error> {
        let now = Utc::now();
        let rows = sqlx::query(
            "UPDATE executions SET \
                status = ?, error_message = ?, end_time = ?, updated_at = ? \
             WHERE status = ?",
        )
        .bind(EXECUTION_FAILED)
        .bind(detail)
        .bind(now)
        .bind(now)
        .bind(EXECUTION_RUNNING)
        .execute(pool)
        .await?
        .rows_affected();

        Ok(rows)
    }
}
