//! The repository capability the engines are written against.
//!
//! Boardroom's engines hold no authoritative state between calls: every
//! operation reads a record, validates, and writes it back through this
//! trait. Any backend (the in-memory [`MemoryStore`](crate::MemoryStore), a
//! SQL table with a version column, a KV store with CAS) can sit behind it
//! as long as it honours two rules:
//!
//! 1. `update` and versioned `delete` are conditional on the row version.
//! 2. Primary and [`unique_keys`](crate::Record::unique_keys) are enforced
//!    atomically with the write.

use std::future::Future;

use crate::{Listing, Page, Record, StoreError, Versioned};

/// CRUD over one entity type with optimistic concurrency.
///
/// Methods return `impl Future + Send` so engines generic over a repository
/// can be driven from any Tokio worker thread.
pub trait Repository<R: Record>: Send + Sync + 'static {
    /// Inserts a new record at version 1.
    ///
    /// # Errors
    /// [`StoreError::Duplicate`] if the key or any unique key is taken.
    fn create(
        &self,
        record: R,
    ) -> impl Future<Output = Result<Versioned<R>, StoreError>> + Send;

    fn find_by_id(
        &self,
        key: &R::Key,
    ) -> impl Future<Output = Result<Option<Versioned<R>>, StoreError>> + Send;

    /// Looks a record up through one of its secondary unique indexes.
    fn find_by_unique_key(
        &self,
        index: &'static str,
        value: &str,
    ) -> impl Future<Output = Result<Option<Versioned<R>>, StoreError>> + Send;

    /// Replaces the record if the stored version still equals
    /// `expected_version`. Returns `Ok(None)` if the row is gone.
    ///
    /// # Errors
    /// - [`StoreError::VersionConflict`] if someone else wrote first.
    /// - [`StoreError::Duplicate`] if the new record claims a unique key
    ///   owned by a different row.
    fn update(
        &self,
        key: &R::Key,
        expected_version: u64,
        record: R,
    ) -> impl Future<Output = Result<Option<Versioned<R>>, StoreError>> + Send;

    /// Deletes the row. With `Some(version)` the delete is conditional.
    /// Returns `false` if nothing was deleted because the row was absent,
    /// which makes repeated deletes harmless.
    fn delete(
        &self,
        key: &R::Key,
        expected_version: Option<u64>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Filters all rows (creation order) and returns one page of matches.
    fn list<F>(
        &self,
        filter: F,
        page: Page,
    ) -> impl Future<Output = Result<Listing<R>, StoreError>> + Send
    where
        F: Fn(&R) -> bool + Send + Sync;
}
