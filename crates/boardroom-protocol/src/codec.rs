//! Codec trait and implementations for persisting records as bytes.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The store layer doesn't care HOW a record is serialized: it just needs
//! something that implements the [`Codec`] trait. Rows go in as bytes and
//! come back out through `decode`, which is the single place untyped data is
//! turned into typed entities.
//!
//! Currently we provide [`JsonCodec`]: JSON keeps the persisted arrays
//! (player ids, decks) as ordered JSON arrays, which mirrors how a SQL
//! backend with JSON columns would hold them.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec lives inside a store that is
/// shared across request-handler tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use boardroom_protocol::{Codec, JsonCodec, OrderedIds, PlayerId};
///
/// let codec = JsonCodec;
/// let seats: OrderedIds<PlayerId> =
///     ["A", "B"].into_iter().map(PlayerId::from).collect();
///
/// let bytes = codec.encode(&seats).unwrap();
/// assert_eq!(bytes, br#"["A","B"]"#);
///
/// let decoded: OrderedIds<PlayerId> = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, seats);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
