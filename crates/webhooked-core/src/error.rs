//! Error types and result handling for storage operations.
//!
//! Classifies database failures so the HTTP layer can map them to the
//! right response without inspecting driver internals.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for repository operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation (unique name, missing parent hook, ...).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested entity not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::ConstraintViolation(format!("unique constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Self::ConstraintViolation(format!("foreign key constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::ConstraintViolation(format!("check constraint violation: {db_err}"))
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for CoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(format!("migration failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = CoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn other_driver_errors_map_to_database() {
        let err = CoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, CoreError::Database(_)));
        assert!(err.to_string().starts_with("Database error"));
    }

    #[test]
    fn every_variant_names_its_kind() {
        let rendered: Vec<String> = [
            CoreError::Database("timeout".to_string()),
            CoreError::NotFound("hook".to_string()),
            CoreError::ConstraintViolation("duplicate name".to_string()),
        ]
        .iter()
        .map(|err| match err {
            CoreError::Database(_) | CoreError::NotFound(_) | CoreError::ConstraintViolation(_) => {
                err.to_string()
            },
        })
        .collect();

        assert_eq!(
            rendered,
            [
                "Database error: timeout",
                "Not found: hook",
                "Constraint violation: duplicate name"
            ]
        );
    }
}
