use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::{reference_ids, Addressable, Linked, Reference};
use crate::identifier::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    OrderedCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    OrderedCollectionPage,
}

/// An ordered sequence of item references. Inbox and outbox are kept
/// newest-first; duplicates are tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollection {
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ordered_items: Vec<Reference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrderedCollection {
    /// An empty collection at `id`.
    pub fn new(id: Identifier) -> Self {
        Self {
            kind: CollectionKind::OrderedCollection,
            id: Some(id),
            total_items: Some(0),
            ordered_items: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ordered_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_items.is_empty()
    }
}

impl Addressable for OrderedCollection {
    fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    fn type_name(&self) -> &str {
        "OrderedCollection"
    }
}

impl Linked for OrderedCollection {
    fn references(&self) -> Vec<&Identifier> {
        reference_ids(&self.ordered_items).collect()
    }
}

/// A bounded window over an [`OrderedCollection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollectionPage {
    #[serde(rename = "type")]
    pub kind: PageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ordered_items: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Identifier>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrderedCollectionPage {
    /// An empty page belonging to `part_of`.
    pub fn new(part_of: Identifier) -> Self {
        Self {
            kind: PageKind::OrderedCollectionPage,
            id: None,
            part_of: Some(part_of),
            start_index: None,
            total_items: None,
            ordered_items: Vec::new(),
            next: None,
            prev: None,
            extra: Map::new(),
        }
    }

    /// The collection this page is a window over: `partOf`, or the page's
    /// own identifier without its pagination query.
    pub fn collection_id(&self) -> Option<Identifier> {
        self.part_of
            .clone()
            .or_else(|| self.id.as_ref().map(Identifier::without_query))
    }
}

impl Addressable for OrderedCollectionPage {
    fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    fn type_name(&self) -> &str {
        "OrderedCollectionPage"
    }
}

impl Linked for OrderedCollectionPage {
    fn references(&self) -> Vec<&Identifier> {
        let mut refs: Vec<&Identifier> = self.part_of.iter().collect();
        refs.extend(reference_ids(&self.ordered_items));
        refs.extend(self.next.iter().chain(self.prev.iter()));
        refs
    }
}
