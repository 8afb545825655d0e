//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors. At the ledger store boundary it is mapped onto
//! [`StoreError`].

use caravan_ledger::StoreError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value does not fit its Rust counterpart.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Whether the failure is a connectivity problem rather than a
    /// rejected statement.
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Postgres(
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Tls(_)
            ) | Self::Config(_)
        )
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Serialization(source) => Self::Serialization(source),
            other if other.is_unavailable() => Self::Unavailable {
                message: other.to_string(),
            },
            other => Self::Rejected {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_map_to_unavailable() {
        let err = StoreError::from(DbError::Postgres(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[test]
    fn missing_rows_map_to_rejected() {
        let err = StoreError::from(DbError::Postgres(sqlx::Error::RowNotFound));
        assert!(matches!(err, StoreError::Rejected { .. }));

        let err = StoreError::from(DbError::CorruptRow(String::from("turn -1")));
        assert!(matches!(err, StoreError::Rejected { message } if message.contains("turn -1")));
    }
}
