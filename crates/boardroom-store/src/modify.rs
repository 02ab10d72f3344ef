//! Optimistic read-modify-write.

use crate::{Record, Repository, StoreError, Versioned};

/// What a successful [`modify`] produced.
#[derive(Debug, Clone)]
pub struct Modified<R, T> {
    /// The record as it now stands in the store.
    pub record: Versioned<R>,
    /// Whatever the mutation closure returned on the attempt that landed.
    pub output: T,
    /// `false` if the closure left the record unchanged and no write was made.
    pub written: bool,
}

/// Reads `key`, applies `mutate` to a copy, and writes it back conditionally
/// on the version that was read.
///
/// On a [`StoreError::VersionConflict`] the whole cycle runs again against
/// the fresh row, so `mutate` must be safe to call more than once and must
/// re-check every precondition it relies on. If `mutate` returns an error
/// nothing is written. Returns `Ok(None)` when the row does not exist.
///
/// # Errors
/// - Whatever `mutate` returns.
/// - [`StoreError::Contended`] after `attempts` lost races.
/// - Any other store error, unchanged.
pub async fn modify<R, S, T, E, F>(
    store: &S,
    key: &R::Key,
    attempts: u32,
    mut mutate: F,
) -> Result<Option<Modified<R, T>>, E>
where
    R: Record,
    S: Repository<R>,
    E: From<StoreError>,
    F: FnMut(&mut R) -> Result<T, E>,
{
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        let Some(current) = store.find_by_id(key).await? else {
            return Ok(None);
        };

        let mut next = current.record.clone();
        let output = mutate(&mut next)?;

        if next == current.record {
            return Ok(Some(Modified {
                record: current,
                output,
                written: false,
            }));
        }

        match store.update(key, current.version, next).await {
            Ok(Some(record)) => {
                return Ok(Some(Modified {
                    record,
                    output,
                    written: true,
                }));
            }
            // Deleted between our read and our write.
            Ok(None) => return Ok(None),
            Err(StoreError::VersionConflict { .. }) => {
                tracing::debug!(kind = R::KIND, %key, attempt, "version conflict, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(StoreError::Contended {
        kind: R::KIND,
        key: key.to_string(),
        attempts,
    }
    .into())
}
