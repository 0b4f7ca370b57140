use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::document::{reference_ids, Addressable, Linked, Reference};
use crate::identifier::Identifier;

/// Actor types from the ActivityStreams vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Person,
    Service,
    Application,
    Group,
    Organization,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Person => "Person",
            ActorKind::Service => "Service",
            ActorKind::Application => "Application",
            ActorKind::Group => "Group",
            ActorKind::Organization => "Organization",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Person" => Some(ActorKind::Person),
            "Service" => Some(ActorKind::Service),
            "Application" => Some(ActorKind::Application),
            "Group" => Some(ActorKind::Group),
            "Organization" => Some(ActorKind::Organization),
            _ => None,
        }
    }
}

/// The per-actor collections reachable from an actor document by property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionProperty {
    Followers,
    Following,
    Liked,
}

impl CollectionProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionProperty::Followers => "followers",
            CollectionProperty::Following => "following",
            CollectionProperty::Liked => "liked",
        }
    }
}

impl fmt::Display for CollectionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An actor document. `inbox` and `outbox` are mandatory; the social
/// collections may be absent, linked, or embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(rename = "type")]
    pub kind: ActorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    pub inbox: Identifier,
    pub outbox: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<Reference>,
    /// Properties the store does not interpret (`@context`, `name`, keys...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Actor {
    /// Build an actor whose collections live under its own identifier:
    /// `{id}/inbox`, `{id}/outbox`, `{id}/followers`, `{id}/following`,
    /// `{id}/liked`.
    pub fn with_standard_collections(kind: ActorKind, id: Identifier) -> Self {
        Self {
            kind,
            preferred_username: None,
            inbox: id.child("inbox"),
            outbox: id.child("outbox"),
            followers: Some(Reference::Id(id.child("followers"))),
            following: Some(Reference::Id(id.child("following"))),
            liked: Some(Reference::Id(id.child("liked"))),
            id: Some(id),
            extra: Map::new(),
        }
    }

    pub fn collection(&self, property: CollectionProperty) -> Option<&Reference> {
        match property {
            CollectionProperty::Followers => self.followers.as_ref(),
            CollectionProperty::Following => self.following.as_ref(),
            CollectionProperty::Liked => self.liked.as_ref(),
        }
    }
}

impl Addressable for Actor {
    fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    fn type_name(&self) -> &str {
        self.kind.as_str()
    }
}

impl Linked for Actor {
    fn references(&self) -> Vec<&Identifier> {
        let mut refs = vec![&self.inbox, &self.outbox];
        refs.extend(reference_ids(
            [&self.followers, &self.following, &self.liked]
                .into_iter()
                .flatten(),
        ));
        refs
    }
}
