//! Storage error classification
//!
//! Only connectivity errors trigger failover. Everything else surfaces to
//! the caller unchanged.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Backend unreachable (I/O, pool exhausted or closed, TLS, protocol)
    #[error("Storage backend unreachable: {0}")]
    Connectivity(String),

    /// Uniqueness, foreign key, check or not-null violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Stored value could not be decoded
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    #[error("Storage error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StorageError::Connectivity(_))
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StorageError::Connectivity(err.to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation()
                    || matches!(db_err.kind(), sqlx::error::ErrorKind::NotNullViolation)
                {
                    StorageError::ConstraintViolation(db_err.message().to_string())
                } else {
                    StorageError::Internal(err.to_string())
                }
            }
            sqlx::Error::RowNotFound
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => StorageError::Corrupt(err.to_string()),
            _ => StorageError::Internal(err.to_string()),
        }
    }
}
