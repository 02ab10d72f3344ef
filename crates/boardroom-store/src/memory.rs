//! In-memory reference implementation of [`Repository`].
//!
//! `MemoryStore` keeps every entity kind in one process-local map and
//! persists rows as codec bytes, exactly as a real backend would. That
//! keeps the decode-and-validate boundary honest: engines never see a record
//! that wasn't round-tripped through the codec.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use boardroom_protocol::{Codec, JsonCodec};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{Listing, Page, Record, Repository, StoreError, UniqueKey, Versioned};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for [`MemoryStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How long an operation waits for the table lock before giving up with
    /// [`StoreError::Timeout`].
    pub acquire_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: 2_000,
        }
    }
}

impl StoreConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Row {
    version: u64,
    seq: u64,
    bytes: Vec<u8>,
    keys: Vec<UniqueKey>,
}

#[derive(Debug, Default)]
struct Table {
    rows: HashMap<String, Row>,
    /// `(index, value)` → owning row key.
    unique: HashMap<(&'static str, String), String>,
    next_seq: u64,
}

impl Table {
    /// Returns the first unique key in `keys` owned by a row other than `owner`.
    fn conflicting<'a>(&self, keys: &'a [UniqueKey], owner: &str) -> Option<&'a UniqueKey> {
        keys.iter().find(|k| {
            self.unique
                .get(&(k.index, k.value.clone()))
                .is_some_and(|held_by| held_by != owner)
        })
    }

    fn release(&mut self, keys: &[UniqueKey]) {
        for k in keys {
            self.unique.remove(&(k.index, k.value.clone()));
        }
    }

    fn claim(&mut self, keys: &[UniqueKey], owner: &str) {
        for k in keys {
            self.unique
                .insert((k.index, k.value.clone()), owner.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

struct Inner<C> {
    tables: RwLock<HashMap<&'static str, Table>>,
    codec: C,
    online: AtomicBool,
    acquire_timeout: Duration,
}

/// A cloneable, process-local store that implements [`Repository<R>`] for
/// every [`Record`] type.
///
/// Clones share the same tables.
pub struct MemoryStore<C: Codec = JsonCodec> {
    inner: Arc<Inner<C>>,
}

impl<C: Codec> Clone for MemoryStore<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl MemoryStore<JsonCodec> {
    pub fn new() -> Self {
        Self::with_config(JsonCodec, StoreConfig::default())
    }
}

impl Default for MemoryStore<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> MemoryStore<C> {
    pub fn with_config(codec: C, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: RwLock::new(HashMap::new()),
                codec,
                online: AtomicBool::new(true),
                acquire_timeout: config.acquire_timeout(),
            }),
        }
    }

    /// Simulates the backend going away (`false`) or coming back (`true`).
    /// While offline every operation fails with [`StoreError::Unavailable`].
    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::SeqCst);
        tracing::info!(online, "memory store availability changed");
    }

    /// Writes raw bytes as a row of `kind`, bypassing encoding and
    /// validation. Lets tests plant rows a broken writer could have left.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn put_raw(
        &self,
        kind: &'static str,
        key: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        let mut tables = self.write().await?;
        let table = tables.entry(kind).or_default();
        table.next_seq += 1;
        let seq = table.next_seq;
        let version = table.rows.get(key).map_or(1, |r| r.version + 1);
        let keys = table.rows.remove(key).map(|r| r.keys).unwrap_or_default();
        table.rows.insert(
            key.to_string(),
            Row {
                version,
                seq,
                bytes,
                keys,
            },
        );
        Ok(())
    }

    /// Number of rows currently stored for `R`.
    pub async fn count<R: Record>(&self) -> Result<usize, StoreError> {
        let tables = self.read().await?;
        Ok(tables.get(R::KIND).map_or(0, |t| t.rows.len()))
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.inner.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    async fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<&'static str, Table>>, StoreError> {
        self.check_online()?;
        let timeout = self.inner.acquire_timeout;
        tokio::time::timeout(timeout, self.inner.tables.read())
            .await
            .map_err(|_| StoreError::Timeout(timeout))
    }

    async fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<&'static str, Table>>, StoreError> {
        self.check_online()?;
        let timeout = self.inner.acquire_timeout;
        tokio::time::timeout(timeout, self.inner.tables.write())
            .await
            .map_err(|_| StoreError::Timeout(timeout))
    }

    fn encode<R: Record>(&self, record: &R) -> Result<Vec<u8>, StoreError> {
        self.inner
            .codec
            .encode(record)
            .map_err(|e| StoreError::Corrupt {
                kind: R::KIND,
                key: record.key().to_string(),
                reason: e.to_string(),
            })
    }

    /// The single place stored bytes become a typed record.
    fn decode<R: Record>(&self, key: &str, version: u64, bytes: &[u8]) -> Result<Versioned<R>, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            kind: R::KIND,
            key: key.to_string(),
            reason,
        };
        let record: R = self
            .inner
            .codec
            .decode(bytes)
            .map_err(|e| corrupt(e.to_string()))?;
        record.validate().map_err(|e| corrupt(e.to_string()))?;
        if record.key().to_string() != key {
            return Err(corrupt(format!("row holds key {}", record.key())));
        }
        Ok(Versioned { version, record })
    }
}

impl<C: Codec> std::fmt::Debug for MemoryStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("online", &self.inner.online.load(Ordering::SeqCst))
            .field("acquire_timeout", &self.inner.acquire_timeout)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Repository impl
// ---------------------------------------------------------------------------

impl<R: Record, C: Codec> Repository<R> for MemoryStore<C> {
    async fn create(&self, record: R) -> Result<Versioned<R>, StoreError> {
        let key = record.key().to_string();
        let keys = record.unique_keys();
        let bytes = self.encode(&record)?;

        let mut tables = self.write().await?;
        let table = tables.entry(R::KIND).or_default();

        if table.rows.contains_key(&key) {
            return Err(StoreError::Duplicate {
                kind: R::KIND,
                index: "primary",
                value: key,
            });
        }
        if let Some(taken) = table.conflicting(&keys, &key) {
            return Err(StoreError::Duplicate {
                kind: R::KIND,
                index: taken.index,
                value: taken.value.clone(),
            });
        }

        table.claim(&keys, &key);
        table.next_seq += 1;
        let seq = table.next_seq;
        table.rows.insert(
            key.clone(),
            Row {
                version: 1,
                seq,
                bytes,
                keys,
            },
        );
        tracing::trace!(kind = R::KIND, %key, "row created");

        Ok(Versioned { version: 1, record })
    }

    async fn find_by_id(&self, key: &R::Key) -> Result<Option<Versioned<R>>, StoreError> {
        let key = key.to_string();
        let (version, bytes) = {
            let tables = self.read().await?;
            match tables.get(R::KIND).and_then(|t| t.rows.get(&key)) {
                Some(row) => (row.version, row.bytes.clone()),
                None => return Ok(None),
            }
        };
        self.decode(&key, version, &bytes).map(Some)
    }

    async fn find_by_unique_key(
        &self,
        index: &'static str,
        value: &str,
    ) -> Result<Option<Versioned<R>>, StoreError> {
        let (key, version, bytes) = {
            let tables = self.read().await?;
            let Some(table) = tables.get(R::KIND) else {
                return Ok(None);
            };
            let Some(owner) = table.unique.get(&(index, value.to_string())) else {
                return Ok(None);
            };
            match table.rows.get(owner) {
                Some(row) => (owner.clone(), row.version, row.bytes.clone()),
                None => return Ok(None),
            }
        };
        self.decode(&key, version, &bytes).map(Some)
    }

    async fn update(
        &self,
        key: &R::Key,
        expected_version: u64,
        record: R,
    ) -> Result<Option<Versioned<R>>, StoreError> {
        if record.key() != key {
            return Err(StoreError::KeyMismatch {
                kind: R::KIND,
                expected: key.to_string(),
                actual: record.key().to_string(),
            });
        }
        let key = key.to_string();
        let keys = record.unique_keys();
        let bytes = self.encode(&record)?;

        let mut tables = self.write().await?;
        let table = tables.entry(R::KIND).or_default();

        let found = match table.rows.get(&key) {
            Some(row) => row.version,
            None => return Ok(None),
        };
        if found != expected_version {
            return Err(StoreError::VersionConflict {
                kind: R::KIND,
                key,
                expected: expected_version,
                found,
            });
        }
        if let Some(taken) = table.conflicting(&keys, &key) {
            return Err(StoreError::Duplicate {
                kind: R::KIND,
                index: taken.index,
                value: taken.value.clone(),
            });
        }

        let old_keys = table
            .rows
            .get(&key)
            .map(|r| r.keys.clone())
            .unwrap_or_default();
        table.release(&old_keys);
        table.claim(&keys, &key);

        let version = found + 1;
        if let Some(row) = table.rows.get_mut(&key) {
            row.version = version;
            row.bytes = bytes;
            row.keys = keys;
        }
        tracing::trace!(kind = R::KIND, %key, version, "row updated");

        Ok(Some(Versioned { version, record }))
    }

    async fn delete(&self, key: &R::Key, expected_version: Option<u64>) -> Result<bool, StoreError> {
        let key = key.to_string();
        let mut tables = self.write().await?;
        let Some(table) = tables.get_mut(R::KIND) else {
            return Ok(false);
        };

        let found = match table.rows.get(&key) {
            Some(row) => row.version,
            None => return Ok(false),
        };
        match expected_version {
            Some(expected) if expected != found => {
                return Err(StoreError::VersionConflict {
                    kind: R::KIND,
                    key,
                    expected,
                    found,
                });
            }
            _ => {}
        }

        if let Some(row) = table.rows.remove(&key) {
            table.release(&row.keys);
        }
        tracing::trace!(kind = R::KIND, %key, "row deleted");
        Ok(true)
    }

    async fn list<F>(&self, filter: F, page: Page) -> Result<Listing<R>, StoreError>
    where
        F: Fn(&R) -> bool + Send + Sync,
    {
        let mut rows: Vec<(u64, String, u64, Vec<u8>)> = {
            let tables = self.read().await?;
            match tables.get(R::KIND) {
                Some(table) => table
                    .rows
                    .iter()
                    .map(|(k, r)| (r.seq, k.clone(), r.version, r.bytes.clone()))
                    .collect(),
                None => Vec::new(),
            }
        };
        rows.sort_by_key(|(seq, ..)| *seq);

        let mut matches = Vec::new();
        for (_, key, version, bytes) in rows {
            let row: Versioned<R> = match self.decode(&key, version, &bytes) {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(kind = R::KIND, %key, error = %e, "skipping corrupt row in listing");
                    continue;
                }
            };
            if filter(&row.record) {
                matches.push(row.record);
            }
        }

        let total = matches.len();
        let items = matches
            .into_iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .collect();

        Ok(Listing { items, total, page })
    }
}
