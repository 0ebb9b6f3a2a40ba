//! First-run admin account.

use runlet_db::models::user::CreateUser;
use runlet_db::repositories::UserRepo;
use runlet_db::DbPool;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};

/// Password seeded when `ADMIN_PASSWORD` is not set.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Create the admin account unless a user with that name already exists.
///
/// Returns `true` if the account was created. An existing account keeps its
/// current password.
pub async fn ensure_admin(pool: &DbPool, username: &str, password: &str) -> AppResult<bool> {
    if UserRepo::find_by_username(pool, username).await?.is_some() {
        tracing::debug!(username, "Admin account already present");
        return Ok(false);
    }

    if password == DEFAULT_ADMIN_PASSWORD {
        tracing::warn!(
            username,
            "Seeding admin account with the default password, change it after first login"
        );
    }

    let password_hash = hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username, "Admin account created");
    Ok(true)
}
