//! Ordered collections stored as documents in the resource store.
//!
//! Three access patterns share one stored [`OrderedCollection`]:
//!
//! ```text
//!                 ┌──────────────── contains(id) ── scan
//!  OrderedCollection ───────────── get_page(params) ── slice + links
//!                 └──────────────── set_page(page) ── merge_page + update
//! ```
//!
//! None of these lock. `set_page` is a read-modify-write, so the caller
//! holds the collection's identifier lock across it.

use std::ops::Range;
use std::sync::Arc;

use tusk_core::{Document, Identifier, OrderedCollection, OrderedCollectionPage};

use crate::config::DbConfig;
use crate::diff::{item_id, merge_page, Merged};
use crate::error::DbError;
use crate::store::ResourceStore;

const OFFSET_PARAM: &str = "offset";
const LIMIT_PARAM: &str = "limit";

/// Offset pagination over a collection. Page identifiers carry these as
/// `?offset=N&limit=M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub offset: usize,
    pub limit: usize,
}

impl PageParams {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    pub fn first(limit: usize) -> Self {
        Self::new(0, limit)
    }

    /// Read `offset`/`limit` from an identifier's query, falling back to
    /// the first page of `default_limit` items.
    pub fn from_identifier(id: &Identifier, default_limit: usize) -> Self {
        let offset = id
            .query_param(OFFSET_PARAM)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let limit = id
            .query_param(LIMIT_PARAM)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_limit);
        Self { offset, limit }
    }

    /// Limit forced into `1..=max`.
    pub fn clamped(self, max: usize) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.clamp(1, max.max(1)),
        }
    }

    /// The slice of a `len`-item collection this page covers.
    pub fn window(&self, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        let end = self.offset.saturating_add(self.limit).min(len);
        start..end
    }

    pub fn page_id(&self, collection: &Identifier) -> Identifier {
        collection.with_query(&[
            (OFFSET_PARAM, self.offset.to_string()),
            (LIMIT_PARAM, self.limit.to_string()),
        ])
    }
}

pub struct OrderedCollectionManager {
    store: Arc<ResourceStore>,
    default_page_size: usize,
    max_page_size: usize,
}

impl OrderedCollectionManager {
    pub fn new(store: Arc<ResourceStore>, config: &DbConfig) -> Self {
        Self {
            store,
            default_page_size: config.default_page_size.max(1),
            max_page_size: config.max_page_size.max(1),
        }
    }

    /// Load the full collection at `id`.
    ///
    /// A local identifier with nothing stored reads as an empty collection,
    /// since collections come into being on first write. A federated one
    /// is `NotFound`.
    pub fn load(&self, id: &Identifier) -> Result<OrderedCollection, DbError> {
        match self.store.get(id) {
            Ok(Document::OrderedCollection(collection)) => Ok(collection),
            Ok(other) => Err(DbError::InvalidDocument(format!(
                "{id} is a {:?}, not an OrderedCollection",
                other.kind()
            ))),
            Err(DbError::NotFound(_)) if self.store.owns(id) => {
                Ok(OrderedCollection::new(id.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// Whether `item` appears anywhere in the collection.
    pub fn contains(&self, collection: &Identifier, item: &Identifier) -> Result<bool, DbError> {
        let full = self.load(collection)?;
        for entry in &full.ordered_items {
            if item_id(entry)? == item {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Pagination parameters carried by a page identifier.
    pub fn page_params(&self, page_id: &Identifier) -> PageParams {
        PageParams::from_identifier(page_id, self.default_page_size).clamped(self.max_page_size)
    }

    /// A bounded slice of the collection with `partOf`/`next`/`prev` links.
    pub fn get_page(
        &self,
        collection: &Identifier,
        params: PageParams,
    ) -> Result<OrderedCollectionPage, DbError> {
        let params = params.clamped(self.max_page_size);
        let full = self.load(collection)?;
        let len = full.len();
        let window = params.window(len);

        let mut page = OrderedCollectionPage::new(collection.clone());
        page.id = Some(params.page_id(collection));
        page.start_index = Some(window.start as u64);
        page.total_items = Some(len as u64);
        page.ordered_items = full.ordered_items[window.clone()].to_vec();
        if window.end < len {
            page.next = Some(PageParams::new(window.end, params.limit).page_id(collection));
        }
        if params.offset > 0 {
            let prev = params.offset.min(len).saturating_sub(params.limit);
            page.prev = Some(PageParams::new(prev, params.limit).page_id(collection));
        }
        Ok(page)
    }

    /// Merge a partial page back into the full collection and persist it.
    ///
    /// The replaced window comes from the page identifier's query, else
    /// `startIndex` with the default page size. A page with neither is
    /// unanchored: its window is empty at the collection start, so its
    /// items are prepended and nothing already stored is removed.
    pub fn set_page(
        &self,
        collection: &Identifier,
        page: &OrderedCollectionPage,
    ) -> Result<Merged, DbError> {
        let mut full = self.load(collection)?;
        let window = self.merge_window(page, full.len());

        let merged = merge_page(&full.ordered_items, window.clone(), &page.ordered_items)?;
        log::debug!(
            "Merged page into {collection} at {}..{}: {} kept, {} inserted, {} removed",
            window.start,
            window.end,
            merged.kept,
            merged.inserted,
            merged.removed
        );

        full.ordered_items = merged.items.clone();
        full.total_items = Some(full.ordered_items.len() as u64);
        if full.id.is_none() {
            full.id = Some(collection.clone());
        }
        self.store.update(Document::from(full))?;
        Ok(merged)
    }

    fn merge_window(&self, page: &OrderedCollectionPage, len: usize) -> Range<usize> {
        let from_id = page
            .id
            .as_ref()
            .filter(|id| id.query_param(OFFSET_PARAM).is_some());
        let params = match (from_id, page.start_index) {
            (Some(id), _) => PageParams::from_identifier(id, self.default_page_size),
            (None, Some(start)) => PageParams::new(start as usize, self.default_page_size),
            (None, None) => return 0..0,
        };
        params.clamped(self.max_page_size).window(len)
    }

    /// Page of an inbox addressed by IRI (pagination query optional).
    pub fn get_inbox(&self, inbox: &Identifier) -> Result<OrderedCollectionPage, DbError> {
        self.get_page(&inbox.without_query(), self.page_params(inbox))
    }

    pub fn set_inbox(&self, page: &OrderedCollectionPage) -> Result<Merged, DbError> {
        self.set_page(&page_collection(page)?, page)
    }

    /// Page of an outbox addressed by IRI (pagination query optional).
    pub fn get_outbox(&self, outbox: &Identifier) -> Result<OrderedCollectionPage, DbError> {
        self.get_page(&outbox.without_query(), self.page_params(outbox))
    }

    pub fn set_outbox(&self, page: &OrderedCollectionPage) -> Result<Merged, DbError> {
        self.set_page(&page_collection(page)?, page)
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }
}

fn page_collection(page: &OrderedCollectionPage) -> Result<Identifier, DbError> {
    page.collection_id().ok_or_else(|| {
        DbError::InvalidDocument("page carries neither partOf nor id".to_string())
    })
}
