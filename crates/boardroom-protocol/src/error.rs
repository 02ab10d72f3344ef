//! Error types for the protocol layer.
//!
//! Each crate in Boardroom defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in serialization or shape
//! validation, not in storage or game rules.

/// Errors that can occur while encoding or decoding records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, wrong data
    /// types, or a duplicate entry in an ordered id array.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The record decoded, but violates an invariant of its type
    /// (e.g. a host that is not seated, overlapping player partitions).
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
