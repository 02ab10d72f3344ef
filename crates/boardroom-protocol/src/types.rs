//! Identity types and the error taxonomy shared by every Boardroom crate.
//!
//! Everything here is a plain value: no I/O, no locking. Higher layers
//! (store, engines, coordinator) build on these so that an id or an error
//! kind means the same thing everywhere.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Declares a string-backed identifier newtype.
///
/// All public handles in Boardroom are short human-shareable strings
/// (see [`ShortCodeGenerator`](crate::ShortCodeGenerator)), so each id is a
/// `String` wrapped in its own type. You can't pass a `RoomId` where a
/// `PlayerId` is expected, even though both are strings underneath.
///
/// `#[serde(transparent)]` keeps the wire/persisted form a bare string:
/// `PlayerId("ABC12345")` is stored as `"ABC12345"`, not `{"0": ...}`.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wraps anything string-like as this id type.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrows the raw string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the id is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// An already-authenticated player identifier (a profile UID).
    PlayerId
);

string_id!(
    /// The public, immutable handle of a room.
    RoomId
);

string_id!(
    /// The public, immutable handle of a game session.
    GameId
);

string_id!(
    /// The primary key of a login credential.
    LoginId
);

// ---------------------------------------------------------------------------
// ErrorKind: the cross-crate error taxonomy
// ---------------------------------------------------------------------------

/// Coarse classification of every error a Boardroom operation can return.
///
/// Each crate keeps its own detailed error enum, but every variant maps to
/// exactly one `ErrorKind`. Callers (an HTTP layer, a CLI, a test) decide
/// how to surface a failure from the kind alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The room, session, or user does not exist.
    NotFound,
    /// Duplicate id, already-in-room, already-exists.
    Conflict,
    /// The entity is in a state that does not allow the operation.
    InvalidStateTransition,
    /// The requester lacks the role the operation needs (e.g. host).
    NotAuthorized,
    /// Malformed input, rejected before any state was touched.
    Validation,
    /// The store was unavailable, timed out, or stayed contended.
    /// Nothing was written, so the call is safe to retry.
    Transient,
    /// A stored row failed to decode or validate.
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InvalidStateTransition => 400,
            Self::NotAuthorized => 403,
            Self::Validation => 422,
            Self::Transient => 503,
            Self::Internal => 500,
        }
    }

    /// Only transient failures are worth retrying unchanged.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "NotFound",
            Self::Conflict => "Conflict",
            Self::InvalidStateTransition => "InvalidStateTransition",
            Self::NotAuthorized => "NotAuthorized",
            Self::Validation => "Validation",
            Self::Transient => "Transient",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_bare_string() {
        let json = serde_json::to_string(&PlayerId::new("ABC12345")).unwrap();
        assert_eq!(json, "\"ABC12345\"");

        let back: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "ABC12345");
    }

    #[test]
    fn test_id_display_is_raw_value() {
        assert_eq!(RoomId::from("room_QWE00001").to_string(), "room_QWE00001");
        assert!(GameId::new("").is_empty());
    }

    #[test]
    fn test_error_kind_status_codes() {
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::NotAuthorized.status_code(), 403);
        assert_eq!(ErrorKind::Transient.status_code(), 503);
    }

    #[test]
    fn test_error_kind_only_transient_is_retryable() {
        assert!(ErrorKind::Transient.is_retryable());
        assert!(!ErrorKind::Conflict.is_retryable());
        assert!(!ErrorKind::Internal.is_retryable());
    }
}
