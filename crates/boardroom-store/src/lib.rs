//! Persistence capability for Boardroom.
//!
//! The engines above this crate are stateless: each operation loads what it
//! needs through a [`Repository`], checks its preconditions, and writes the
//! result back with an optimistic version check. Two guarantees come from
//! here rather than from engine code:
//!
//! - **No lost updates.** Every row carries a version; a write against a
//!   stale version fails with [`StoreError::VersionConflict`] and
//!   [`modify`] re-runs the caller's mutation on fresh data.
//! - **Cross-row uniqueness.** A [`Record`] declares [`UniqueKey`]s (a
//!   player's seat, a room's live game, a username). The store claims them
//!   atomically with the write, so two rows can never hold the same one.
//!
//! [`MemoryStore`] is the in-process reference backend.

#![allow(async_fn_in_trait)]

mod error;
mod memory;
mod modify;
mod record;
mod repository;

pub use error::StoreError;
pub use memory::{MemoryStore, StoreConfig};
pub use modify::{Modified, modify};
pub use record::{Listing, Page, Record, UniqueKey, Versioned};
pub use repository::Repository;
