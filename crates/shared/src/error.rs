//! Error types for Teamhub persistence

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Team not found: {0}")]
    NotFound(String),

    #[error("Team code already in use: {0}")]
    CodeTaken(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Returns true when the error is a PostgreSQL unique violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
