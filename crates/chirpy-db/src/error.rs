//! Database error types

use chirpy_auth::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

impl DbError {
    /// Map a unique-constraint violation to `Duplicate`, pass anything else through
    pub(crate) fn from_insert(err: sqlx::Error, what: impl Into<String>) -> Self {
        let is_unique = err
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);

        if is_unique {
            DbError::Duplicate(what.into())
        } else {
            DbError::Connection(err)
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        StoreError::new(err)
    }
}
