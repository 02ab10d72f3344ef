//! The shape of anything a repository can hold.

use std::fmt;

use boardroom_protocol::ProtocolError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A secondary unique index entry, e.g. `("seat", "P1")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub index: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(index: &'static str, value: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
        }
    }
}

/// An entity that can be persisted in a [`Repository`](crate::Repository).
///
/// Records are stored whole and decoded whole. `validate` runs after every
/// decode, so a row that deserializes but breaks an invariant of its type
/// (a host who isn't seated, a player in two partitions) is rejected at the
/// store boundary instead of reaching engine code.
pub trait Record:
    Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static
{
    /// Human-readable entity name used in errors and logs ("room", "game").
    const KIND: &'static str;

    /// The primary key type. Immutable for the life of the record.
    type Key: Clone + Eq + fmt::Display + Send + Sync + 'static;

    fn key(&self) -> &Self::Key;

    /// Secondary unique keys the store must enforce atomically on write.
    ///
    /// The set may depend on state: a room only claims its players' seats
    /// while it is live.
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    /// Checks invariants that serde alone can't express.
    fn validate(&self) -> Result<(), ProtocolError> {
        Ok(())
    }
}

/// A record together with the row version it was read at.
///
/// The version is what makes read-modify-write safe: hand it back to
/// [`Repository::update`](crate::Repository::update) and the write only
/// lands if nobody else wrote in between.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<R> {
    pub version: u64,
    pub record: R,
}

impl<R> Versioned<R> {
    pub fn into_record(self) -> R {
        self.record
    }
}

/// 1-based pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Everything on one page.
    pub fn all() -> Self {
        Self {
            page: 1,
            limit: u32::MAX,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1).saturating_mul(self.limit as usize)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of a filtered listing plus the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<R> {
    pub items: Vec<R>,
    pub total: usize,
    pub page: Page,
}

impl<R> Listing<R> {
    pub fn total_pages(&self) -> usize {
        let limit = self.page.limit.max(1) as usize;
        self.total.div_ceil(limit)
    }
}
