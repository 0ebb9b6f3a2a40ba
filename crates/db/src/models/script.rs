//! Script entity model and DTOs.

use runlet_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered script.
///
/// `script_type` is stored as given; it is only checked against the known
/// runtimes when the script is run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Script {
    pub id: DbId,
    pub name: String,
    pub script_type: String,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a new script.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScript {
    pub name: String,
    pub script_type: String,
    pub content: String,
}

/// DTO for updating an existing script. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScript {
    pub name: Option<String>,
    pub script_type: Option<String>,
    pub content: Option<String>,
}
