//! Content backends for the resource store.
//!
//! Architecture:
//! ```text
//! ┌───────────────┐   ContentEntry   ┌────────────────────────────────┐
//! │ ResourceStore │ ───────────────► │ dyn ContentBackend             │
//! │ (ownership,   │                  ├────────────────┬───────────────┤
//! │  linkage idx) │                  │ MemoryBackend  │ RocksBackend  │
//! └───────────────┘                  │ (sharded map)  │ CF content    │
//!                                    │                │ CF metadata   │
//!                                    └────────────────┴───────────────┘
//! ```
//!
//! Backends are interchangeable: the store's observable behaviour does not
//! depend on which one is plugged in.

pub mod memory;
pub mod rocks;

pub use memory::MemoryBackend;
pub use rocks::{EntryMetadata, RocksBackend, StoreConfig};

use std::time::SystemTime;
use tusk_core::{Document, Identifier};

use crate::error::DbError;

/// The stored unit: one per identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEntry {
    pub id: Identifier,
    pub document: Document,
    /// Set from ownership when the entry is first created; never recomputed
    pub is_local: bool,
    /// Creation timestamp (seconds since epoch)
    pub created_at: u64,
    /// Last overwrite timestamp (seconds since epoch)
    pub updated_at: u64,
}

impl ContentEntry {
    pub fn new(id: Identifier, document: Document, is_local: bool) -> Self {
        let now = now_secs();
        Self {
            id,
            document,
            is_local,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Storage behind the resource store.
///
/// Implementations must be safe to call concurrently from any number of
/// threads; they provide no per-identifier atomicity beyond single calls.
pub trait ContentBackend: Send + Sync {
    fn load(&self, id: &Identifier) -> Result<Option<ContentEntry>, DbError>;

    /// Insert or overwrite the entry at `entry.id`.
    fn save(&self, entry: &ContentEntry) -> Result<(), DbError>;

    /// Remove the entry, returning what was stored.
    fn remove(&self, id: &Identifier) -> Result<Option<ContentEntry>, DbError>;

    fn contains(&self, id: &Identifier) -> Result<bool, DbError>;

    /// Every stored entry. Used to rebuild in-memory indexes on open.
    fn entries(&self) -> Result<Vec<ContentEntry>, DbError>;

    fn len(&self) -> Result<usize, DbError>;
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
