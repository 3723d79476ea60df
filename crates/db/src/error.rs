//! Classification of sqlx errors at the persistence boundary.
//!
//! Repositories that return [`StoreResult`] convert driver errors into the
//! [`CoreError`] taxonomy here, so callers above this crate never match on
//! SQLSTATE codes.

use questy_core::error::CoreError;

/// Result type for repository operations that classify their own errors.
pub type StoreResult<T> = Result<T, CoreError>;

/// `unique_violation`
pub const UNIQUE_VIOLATION: &str = "23505";
/// `not_null_violation`
pub const NOT_NULL_VIOLATION: &str = "23502";
/// `check_violation`
pub const CHECK_VIOLATION: &str = "23514";
/// `foreign_key_violation`
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// `string_data_right_truncation`
pub const STRING_TRUNCATION: &str = "22001";
/// `invalid_text_representation` (e.g. a malformed UUID literal)
pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Map a sqlx error into the domain taxonomy.
///
/// Constraint violations become `Validation`, a missing row becomes
/// `NotFound`, anything unrecognised becomes `Internal`.
pub fn classify(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::RowNotFound => CoreError::NotFound {
            entity: "Resource",
            id: "unknown".into(),
        },
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => CoreError::Validation(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                )),
                Some(NOT_NULL_VIOLATION) => {
                    CoreError::Validation("A required field is missing".into())
                }
                Some(CHECK_VIOLATION) => {
                    CoreError::Validation(format!("Value violates constraint: {constraint}"))
                }
                Some(STRING_TRUNCATION) => {
                    CoreError::Validation("A value exceeds its maximum length".into())
                }
                Some(INVALID_TEXT_REPRESENTATION) => CoreError::invalid_id(),
                Some(FOREIGN_KEY_VIOLATION) => CoreError::NotFound {
                    entity: "Referenced entity",
                    id: constraint.to_string(),
                },
                _ => {
                    tracing::error!(error = %db_err, "Unclassified database error");
                    CoreError::Internal("database error".into())
                }
            }
        }
        other => {
            tracing::error!(error = %other, "Database error");
            CoreError::Internal("database error".into())
        }
    }
}

/// True if `err` is a unique violation on the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
