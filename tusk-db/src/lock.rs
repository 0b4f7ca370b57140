//! Per-identifier exclusive locks.
//!
//! ```text
//! acquire(id) ──► registry.get_or_insert_with(id)   (atomic, one entry per id)
//!                        │
//!                        ▼
//!                 LockEntry { mutex, held }
//!                        │ lock_owned().await  ◄── only blocking point
//!                        ▼
//!                 held = Some(guard)
//! release(id) ──► held.take() ──► guard dropped ──► next waiter proceeds
//! ```
//!
//! Entries are created lazily and never removed, so a release can never
//! race a teardown of the entry a waiter is queued on. The tokio mutex
//! queues waiters FIFO.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use tusk_core::Identifier;

use crate::error::DbError;
use crate::shard::ShardedMap;

/// Lock state for one identifier.
struct LockEntry {
    /// The exclusive lock itself
    mutex: Arc<tokio::sync::Mutex<()>>,
    /// Guard parked here between `acquire` and `release`
    held: Mutex<Option<OwnedMutexGuard<()>>>,
}

impl LockEntry {
    fn new() -> Self {
        Self {
            mutex: Arc::new(tokio::sync::Mutex::new(())),
            held: Mutex::new(None),
        }
    }
}

/// Registry of identifier locks.
///
/// `acquire`/`release` bracket every mutation of an identifier. The
/// registry itself is internally synchronized; the locks it hands out are
/// the domain-level serialization points.
pub struct IdentifierLock {
    entries: ShardedMap<Identifier, Arc<LockEntry>>,
}

impl IdentifierLock {
    pub fn new() -> Self {
        Self {
            entries: ShardedMap::new(),
        }
    }

    fn entry(&self, id: &Identifier) -> Arc<LockEntry> {
        self.entries.get_or_insert_with(id, || Arc::new(LockEntry::new()))
    }

    /// Block until the exclusive lock for `id` is held, or `cancel` fires.
    pub async fn acquire(
        &self,
        id: &Identifier,
        cancel: &CancellationToken,
    ) -> Result<(), DbError> {
        let entry = self.entry(id);
        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("Lock acquisition on {id} cancelled");
                return Err(DbError::Cancelled(id.clone()));
            }
            guard = entry.mutex.clone().lock_owned() => guard,
        };
        *entry.held.lock() = Some(guard);
        log::trace!("Acquired lock on {id}");
        Ok(())
    }

    /// Like [`acquire`](Self::acquire), giving up with `Cancelled` after
    /// `timeout`.
    pub async fn acquire_timeout(&self, id: &Identifier, timeout: Duration) -> Result<(), DbError> {
        let cancel = CancellationToken::new();
        let deadline = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                cancel.cancel();
            })
        };
        let result = self.acquire(id, &cancel).await;
        deadline.abort();
        result
    }

    /// Release a lock taken with `acquire`.
    ///
    /// Fails with `LockNotHeld` if the identifier has never been locked or
    /// is not currently held.
    ///
    /// Only the context that acquired the lock may release it. Holders are
    /// not tracked, so a release from any other context (another task, or
    /// another clone of the owning handle) is unsupported and goes
    /// undetected: it frees the lock out from under the holder.
    pub fn release(&self, id: &Identifier) -> Result<(), DbError> {
        let entry = match self.entries.get(id) {
            Some(entry) => entry,
            None => {
                log::warn!("Release of {id} which was never locked");
                return Err(DbError::LockNotHeld(id.clone()));
            }
        };

        let guard = entry.held.lock().take();
        match guard {
            Some(guard) => {
                drop(guard);
                log::trace!("Released lock on {id}");
                Ok(())
            }
            None => {
                log::warn!("Release of {id} which is not held");
                Err(DbError::LockNotHeld(id.clone()))
            }
        }
    }

    /// Acquire several locks in the global order (canonical identifier
    /// string, ascending), skipping duplicates.
    ///
    /// On cancellation every lock taken so far is released again.
    /// Returns the identifiers in the order they were locked.
    pub async fn acquire_all(
        &self,
        ids: &[Identifier],
        cancel: &CancellationToken,
    ) -> Result<Vec<Identifier>, DbError> {
        let ordered = lock_order(ids);
        for (taken, id) in ordered.iter().enumerate() {
            if let Err(e) = self.acquire(id, cancel).await {
                for held in ordered[..taken].iter().rev() {
                    let _ = self.release(held);
                }
                return Err(e);
            }
        }
        Ok(ordered)
    }

    /// Release several locks in reverse global order. Every identifier is
    /// attempted; the first failure is returned.
    pub fn release_all(&self, ids: &[Identifier]) -> Result<(), DbError> {
        let mut first_err = None;
        for id in lock_order(ids).iter().rev() {
            if let Err(e) = self.release(id) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Whether `id` is currently held.
    pub fn is_locked(&self, id: &Identifier) -> bool {
        self.entries
            .get(id)
            .map(|entry| entry.held.lock().is_some())
            .unwrap_or(false)
    }

    /// Number of lock entries ever created.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IdentifierLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted, deduplicated copy of `ids`.
fn lock_order(ids: &[Identifier]) -> Vec<Identifier> {
    let mut ordered = ids.to_vec();
    ordered.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ordered.dedup();
    ordered
}
