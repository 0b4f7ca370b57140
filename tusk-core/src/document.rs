//! Typed federation documents and the capabilities the store relies on.
//!
//! A [`Document`] is one of a small set of vocabulary kinds. The store
//! never looks inside a document beyond two capabilities:
//!
//! - [`Addressable`] — extract the document's own identifier and type name
//! - [`Linked`] — enumerate the identifiers the document refers to
//!
//! Properties are either a bare identifier or an embedded document
//! ([`Reference`]); the store resolves both to an identifier before loading.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::activity::{Activity, ActivityKind, Object};
use crate::actor::{Actor, ActorKind};
use crate::collection::{OrderedCollection, OrderedCollectionPage};
use crate::identifier::Identifier;

/// Identifier extraction.
pub trait Addressable {
    /// The document's own identifier, if it carries one.
    fn id(&self) -> Option<&Identifier>;

    /// ActivityStreams type name (`Person`, `Create`, `OrderedCollection`, ...).
    fn type_name(&self) -> &str;
}

/// Reference resolution.
pub trait Linked {
    /// Every identifier this document refers to, in property order.
    fn references(&self) -> Vec<&Identifier>;
}

/// A property value: either a link to another document or the document
/// itself embedded inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(Identifier),
    Embedded(Box<Document>),
}

impl Reference {
    /// Resolve to an identifier. Embedded documents without an `id` have
    /// nothing to resolve to.
    pub fn id(&self) -> Option<&Identifier> {
        match self {
            Reference::Id(id) => Some(id),
            Reference::Embedded(doc) => doc.id(),
        }
    }

    pub fn embedded(&self) -> Option<&Document> {
        match self {
            Reference::Id(_) => None,
            Reference::Embedded(doc) => Some(doc),
        }
    }
}

impl From<Identifier> for Reference {
    fn from(id: Identifier) -> Self {
        Reference::Id(id)
    }
}

impl From<Document> for Reference {
    fn from(doc: Document) -> Self {
        Reference::Embedded(Box::new(doc))
    }
}

/// Document kind tag, used for logging and identifier minting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Actor,
    Activity,
    Object,
    OrderedCollection,
    OrderedCollectionPage,
}

impl DocumentKind {
    /// The kind a `type` name decodes to. Unreserved names are objects.
    pub fn of_type_name(name: &str) -> DocumentKind {
        match name {
            "OrderedCollectionPage" => DocumentKind::OrderedCollectionPage,
            "OrderedCollection" => DocumentKind::OrderedCollection,
            _ if ActorKind::from_name(name).is_some() => DocumentKind::Actor,
            _ if ActivityKind::from_name(name).is_some() => DocumentKind::Activity,
            _ => DocumentKind::Object,
        }
    }
}

/// A stored federation document.
///
/// Deserialization reads the `type` property and decodes into the variant
/// [`DocumentKind::of_type_name`] names for it. A document whose required
/// properties for that variant are missing is rejected rather than
/// decoded as a plain [`Object`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    OrderedCollectionPage(OrderedCollectionPage),
    OrderedCollection(OrderedCollection),
    Actor(Actor),
    Activity(Activity),
    Object(Object),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Actor(_) => DocumentKind::Actor,
            Document::Activity(_) => DocumentKind::Activity,
            Document::Object(_) => DocumentKind::Object,
            Document::OrderedCollection(_) => DocumentKind::OrderedCollection,
            Document::OrderedCollectionPage(_) => DocumentKind::OrderedCollectionPage,
        }
    }

    pub fn as_actor(&self) -> Option<&Actor> {
        match self {
            Document::Actor(actor) => Some(actor),
            _ => None,
        }
    }

    pub fn as_ordered_collection(&self) -> Option<&OrderedCollection> {
        match self {
            Document::OrderedCollection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Whether the variant agrees with the `type` name, i.e. the document
    /// decodes back to the same variant after encoding. Only an [`Object`]
    /// built with a reserved type name (`Person`, `Follow`,
    /// `OrderedCollection`, ...) can disagree.
    pub fn is_well_typed(&self) -> bool {
        DocumentKind::of_type_name(self.type_name()) == self.kind()
    }

    fn inner(&self) -> &dyn Capabilities {
        match self {
            Document::Actor(d) => d,
            Document::Activity(d) => d,
            Document::Object(d) => d,
            Document::OrderedCollection(d) => d,
            Document::OrderedCollectionPage(d) => d,
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let kind = match value.get("type") {
            Some(Value::String(name)) => DocumentKind::of_type_name(name),
            Some(_) => return Err(de::Error::custom("`type` must be a string")),
            None => return Err(de::Error::missing_field("type")),
        };
        let document = match kind {
            DocumentKind::OrderedCollectionPage => {
                serde_json::from_value(value).map(Document::OrderedCollectionPage)
            }
            DocumentKind::OrderedCollection => {
                serde_json::from_value(value).map(Document::OrderedCollection)
            }
            DocumentKind::Actor => serde_json::from_value(value).map(Document::Actor),
            DocumentKind::Activity => serde_json::from_value(value).map(Document::Activity),
            DocumentKind::Object => serde_json::from_value(value).map(Document::Object),
        };
        document.map_err(de::Error::custom)
    }
}

trait Capabilities: Addressable + Linked {}

impl<T: Addressable + Linked> Capabilities for T {}

impl Addressable for Document {
    fn id(&self) -> Option<&Identifier> {
        self.inner().id()
    }

    fn type_name(&self) -> &str {
        self.inner().type_name()
    }
}

impl Linked for Document {
    fn references(&self) -> Vec<&Identifier> {
        self.inner().references()
    }
}

impl From<Actor> for Document {
    fn from(actor: Actor) -> Self {
        Document::Actor(actor)
    }
}

impl From<Activity> for Document {
    fn from(activity: Activity) -> Self {
        Document::Activity(activity)
    }
}

impl From<Object> for Document {
    fn from(object: Object) -> Self {
        Document::Object(object)
    }
}

impl From<OrderedCollection> for Document {
    fn from(collection: OrderedCollection) -> Self {
        Document::OrderedCollection(collection)
    }
}

impl From<OrderedCollectionPage> for Document {
    fn from(page: OrderedCollectionPage) -> Self {
        Document::OrderedCollectionPage(page)
    }
}

/// Collect the identifiers of optional references, skipping embedded
/// documents that carry none.
pub(crate) fn reference_ids<'a>(
    refs: impl IntoIterator<Item = &'a Reference>,
) -> impl Iterator<Item = &'a Identifier> {
    refs.into_iter().filter_map(Reference::id)
}
