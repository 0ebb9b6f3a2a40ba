use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Reject blank required text fields with a [`CoreError::Validation`].
pub fn require_non_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn blank_field_is_rejected() {
        let err = require_non_blank("name", "   ").unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "name is required");
    }

    #[test]
    fn non_blank_field_passes() {
        assert!(require_non_blank("content", "echo hi").is_ok());
    }

    #[test]
    fn not_found_display() {
        let err = CoreError::NotFound {
            entity: "script",
            id: 7,
        };
        assert_eq!(err.to_string(), "Entity not found: script with id 7");
    }
}
