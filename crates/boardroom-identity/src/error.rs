//! Error types for the identity layer.

use boardroom_protocol::ErrorKind;
use boardroom_store::StoreError;

/// Errors from account, profile, and token operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    /// Unknown user or wrong password. Deliberately doesn't say which.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account {0} is disabled")]
    AccountDisabled(String),

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// Every generated candidate id collided with an existing one.
    #[error("could not generate a unique {0} id")]
    IdGenerationExhausted(&'static str),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The token is unknown, revoked, or was rotated away.
    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UsernameTaken(_) | Self::EmailTaken(_) => ErrorKind::Conflict,
            Self::InvalidCredentials
            | Self::AccountDisabled(_)
            | Self::InvalidToken
            | Self::TokenExpired => ErrorKind::NotAuthorized,
            Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::IdGenerationExhausted(_) => ErrorKind::Transient,
            Self::Hashing(_) => ErrorKind::Internal,
            Self::Store(e) => e.kind(),
        }
    }
}
