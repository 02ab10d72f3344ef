//! Authentication hook for resolving a bearer token to a player.
//!
//! The room and game engines never authenticate anyone: every operation
//! takes an already-resolved [`PlayerId`]. Whatever sits in front of them
//! (an HTTP handler, a socket handshake, a CLI) turns the caller's token into
//! that id through an [`Authenticator`]. [`TokenIssuer`](crate::TokenIssuer)
//! is the built-in implementation; a JWT verifier or an external identity
//! provider can stand in for it without touching engine code.

use boardroom_protocol::PlayerId;

use crate::IdentityError;

/// Validates an access token and returns the player it was issued to.
///
/// # Example
///
/// ```rust
/// use boardroom_identity::{Authenticator, IdentityError};
/// use boardroom_protocol::PlayerId;
///
/// /// Treats the token itself as the player id. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<PlayerId, IdentityError> {
///         if token.is_empty() {
///             return Err(IdentityError::InvalidToken);
///         }
///         Ok(PlayerId::from(token))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// # Errors
    /// [`IdentityError::InvalidToken`] or [`IdentityError::TokenExpired`].
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, IdentityError>> + Send;
}
