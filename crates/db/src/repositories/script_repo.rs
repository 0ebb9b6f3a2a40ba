//! Repository for the `scripts` table.

use chrono::Utc;
use runlet_core::types::DbId;

use crate::models::script::{CreateScript, Script, UpdateScript};
use crate::DbPool;

/// Column list for `scripts` SELECT queries.
const COLUMNS: &str = "id, name, script_type, content, created_at, updated_at";

/// Provides CRUD operations for registered scripts.
pub struct ScriptRepo;

impl ScriptRepo {
    /// Register a new script.
    pub async fn create(pool: &DbPool, dto: &CreateScript) -> Result<Script, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO scripts (name, script_type, content, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Script>(&query)
            .bind(&dto.name)
            .bind(&dto.script_type)
            .bind(&dto.content)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a live script by ID. Soft-deleted scripts are not returned.
    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Script>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scripts WHERE id = ? AND deleted_at IS NULL");
        sqlx::query_as::<_, Script>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List live scripts, oldest first.
    pub async fn list(pool: &DbPool) -> Result<Vec<Script>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM scripts WHERE deleted_at IS NULL ORDER BY id ASC");
        sqlx::query_as::<_, Script>(&query).fetch_all(pool).await
    }

    /// Update a script. Only non-`None` fields in the DTO are applied.
    pub async fn update(
        pool: &DbPool,
        id: DbId,
        dto: &UpdateScript,
    ) -> Result<Option<Script>, sqlx::Error> {
        let query = format!(
            "UPDATE scripts SET \
                name = COALESCE(?, name), \
                script_type = COALESCE(?, script_type), \
                content = COALESCE(?, content), \
                updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Script>(&query)
            .bind(&dto.name)
            .bind(&dto.script_type)
            .bind(&dto.content)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a script. Returns `false` if it was missing or already deleted.
    pub async fn soft_delete(pool: &DbPool, id: DbId) -> Result<bool, sqlx::Error> {
        let rows = sqlx::query(
            "UPDATE scripts SET deleted_at = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }
}
