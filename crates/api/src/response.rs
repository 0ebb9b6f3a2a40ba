//! Success envelope for the JSON API.
//!
//! Handlers wrap every successful body as `{"data": ...}`; failures are
//! rendered by [`AppError`](crate::error::AppError) as `{"error", "code"}`.

use serde::Serialize;

/// `{"data": T}`. Scripts, execution records, and run submissions all go
/// out through this.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
