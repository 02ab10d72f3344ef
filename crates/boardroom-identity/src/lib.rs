//! Accounts and identity for Boardroom.
//!
//! This crate answers "who is this player?" so the engines don't have to:
//!
//! 1. **Accounts**: sign-up and sign-in ([`IdentityStore`]), with argon2id
//!    password hashes ([`PasswordHashing`]).
//! 2. **Profiles**: the public face of an account ([`Profile`]), including
//!    the `uid` that rooms and games know as a [`PlayerId`].
//! 3. **Tokens**: short-lived access tokens and rotating refresh tokens
//!    ([`TokenIssuer`]), resolved through the [`Authenticator`] trait.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby (above)       ← records game results, resolves tokens to PlayerIds
//!     ↕
//! Identity (this crate)
//!     ↕
//! Store (below)       ← Credential and Profile rows
//! ```
//!
//! [`PlayerId`]: boardroom_protocol::PlayerId

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod models;
mod password;
mod store;
mod tokens;

pub use auth::Authenticator;
pub use error::IdentityError;
pub use models::{
    Credential, IdentityConfig, Profile, ProfilePatch, ProfileStatus, level_for,
};
pub use password::PasswordHashing;
pub use store::IdentityStore;
pub use tokens::{TokenConfig, TokenIssuer, TokenPair};
