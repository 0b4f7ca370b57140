//! # tusk-core — Federation vocabulary for the Tusk node
//!
//! Typed documents the persistence core stores and links together.
//!
//! ```text
//! ┌────────────┐  inbox / outbox   ┌───────────────────┐
//! │   Actor    │ ────────────────► │ OrderedCollection │
//! │ (Person…)  │  followers, …     │  orderedItems: [] │
//! └────────────┘                   └─────────┬─────────┘
//!                                            │ windowed as
//!                                            ▼
//!                                  ┌───────────────────────┐
//!                                  │ OrderedCollectionPage │
//!                                  └───────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`identifier`] — Canonicalized absolute identifiers
//! - [`document`] — The `Document` sum type, `Reference`, capability traits
//! - [`actor`], [`activity`], [`collection`] — Vocabulary kinds
//! - [`codec`] — JSON wire codec

pub mod activity;
pub mod actor;
pub mod codec;
pub mod collection;
pub mod document;
pub mod identifier;

pub use activity::{Activity, ActivityKind, Object};
pub use actor::{Actor, ActorKind, CollectionProperty};
pub use codec::{decode, encode, encode_pretty, CodecError};
pub use collection::{CollectionKind, OrderedCollection, OrderedCollectionPage, PageKind};
pub use document::{Addressable, Document, DocumentKind, Linked, Reference};
pub use identifier::{Identifier, IdentifierError};
