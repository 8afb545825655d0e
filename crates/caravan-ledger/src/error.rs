//! Error types for the `caravan-ledger` crate.
//!
//! [`StoreError`] is fatal to the operation that hit it: the backing store
//! could not be read or refused a write. [`DataShapeError`] is per record:
//! one stored entry did not match the ledger wire shape and was skipped.

use caravan_types::CityName;

/// Errors raised by a [`LedgerStore`](crate::store::LedgerStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("ledger store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The store refused a read or write.
    #[error("ledger store rejected the operation: {message}")]
    Rejected {
        /// Description of the failure.
        message: String,
    },

    /// A ledger could not be serialized for storage.
    #[error("ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A stored ledger entry that does not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataShapeError {
    /// The ledger blob itself is not a JSON object.
    #[error("ledger is not an object")]
    LedgerNotAnObject,

    /// A resource bucket is not a JSON object of origin -> record.
    #[error("resource {resource} is not an object")]
    ResourceNotAnObject {
        /// The resource key.
        resource: String,
    },

    /// A record could not be parsed (e.g. missing `rate`).
    #[error("record {resource}/{origin} is malformed: {reason}")]
    InvalidRecord {
        /// The resource key.
        resource: String,
        /// The origin city key.
        origin: String,
        /// Why parsing failed.
        reason: String,
    },
}

/// A [`DataShapeError`] found in the ledger of a specific city.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("ledger of {city}: {error}")]
pub struct MalformedRecord {
    /// The city whose stored ledger held the bad entry.
    pub city: CityName,
    /// What was wrong with it.
    pub error: DataShapeError,
}
