//! Error types for the store layer.

use boardroom_protocol::ErrorKind;

/// Errors that can occur in a repository store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A primary or secondary unique key is already taken.
    /// `index` is `"primary"` for the record key, otherwise the name
    /// returned by [`Record::unique_keys`](crate::Record::unique_keys).
    #[error("duplicate {kind} on index '{index}': {value}")]
    Duplicate {
        kind: &'static str,
        index: &'static str,
        value: String,
    },

    /// The row changed since it was read. The caller should re-read and
    /// re-validate before trying again.
    #[error("{kind} {key} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        kind: &'static str,
        key: String,
        expected: u64,
        found: u64,
    },

    /// Optimistic retries ran out while other writers kept winning.
    #[error("{kind} {key} stayed contended after {attempts} attempts")]
    Contended {
        kind: &'static str,
        key: String,
        attempts: u32,
    },

    /// A stored row failed to decode or failed its shape validation.
    #[error("corrupt {kind} row {key}: {reason}")]
    Corrupt {
        kind: &'static str,
        key: String,
        reason: String,
    },

    /// The record handed to `update` does not belong to the given key.
    #[error("{kind} key mismatch: expected {expected}, record has {actual}")]
    KeyMismatch {
        kind: &'static str,
        expected: String,
        actual: String,
    },

    /// The backing store is not reachable.
    #[error("store unavailable")]
    Unavailable,

    /// The store did not answer within its deadline.
    #[error("store timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl StoreError {
    /// Maps this error onto the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Duplicate { .. } => ErrorKind::Conflict,
            Self::VersionConflict { .. }
            | Self::Contended { .. }
            | Self::Unavailable
            | Self::Timeout(_) => ErrorKind::Transient,
            Self::Corrupt { .. } | Self::KeyMismatch { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the index name if this is a duplicate-key error.
    pub fn duplicate_index(&self) -> Option<&'static str> {
        match self {
            Self::Duplicate { index, .. } => Some(index),
            _ => None,
        }
    }
}
