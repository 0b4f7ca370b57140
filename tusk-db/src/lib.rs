//! # tusk-db — Persistence and concurrency core for a federated node
//!
//! Stores addressable federation documents, serializes mutation per
//! identifier, decides locality and maintains the ordered collections
//! (inbox, outbox, followers, following, liked) actors point at.
//!
//! ## Architecture
//!
//! ```text
//!   protocol engine (caller)
//!        │ lock / unlock
//!        ▼
//! ┌──────────────┐      ┌─────────────────────────┐      ┌──────────────┐
//! │IdentifierLock│      │ OrderedCollectionManager│◄─────│ ActorLinkage │
//! │ (per-id)     │      │ contains / pages / merge│      │ fwd + reverse│
//! └──────────────┘      └────────────┬────────────┘      └──────┬───────┘
//!                                    ▼                          │
//!                       ┌─────────────────────────┐             │
//!                       │ ResourceStore           │◄────────────┘
//!                       │ ownership · idgen · idx │
//!                       └────────────┬────────────┘
//!                                    ▼
//!                          dyn ContentBackend
//!                      (MemoryBackend | RocksBackend)
//! ```
//!
//! Only lock acquisition blocks. Everything else returns promptly and
//! assumes the caller already holds whatever locks it needs.
//!
//! ## Modules
//!
//! - [`lock`] — per-identifier exclusive locks with cancellation
//! - [`store`] — document CRUD with locality tagging
//! - [`storage`] — in-memory and RocksDB content backends
//! - [`collection`] — ordered collections and pagination
//! - [`diff`] — merging a partial page back into its collection
//! - [`linkage`] — actor ↔ inbox/outbox/collections
//! - [`db`] — the [`Database`] facade

pub mod collection;
pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod idgen;
pub mod index;
pub mod linkage;
pub mod lock;
pub mod ownership;
pub mod shard;
pub mod storage;
pub mod store;

// Re-exports for convenience
pub use collection::{OrderedCollectionManager, PageParams};
pub use config::DbConfig;
pub use db::Database;
pub use diff::{merge_page, Merged};
pub use error::DbError;
pub use idgen::IdentifierGenerator;
pub use index::LinkageIndex;
pub use linkage::ActorLinkage;
pub use lock::IdentifierLock;
pub use ownership::OwnershipResolver;
pub use shard::ShardedMap;
pub use storage::{
    ContentBackend, ContentEntry, EntryMetadata, MemoryBackend, RocksBackend, StoreConfig,
};
pub use store::ResourceStore;
pub use tokio_util::sync::CancellationToken;
