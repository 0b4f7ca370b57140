use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::{reference_ids, Addressable, Linked, Reference};
use crate::identifier::Identifier;

/// Activity types the store recognises as activities. Their meaning is
/// the protocol engine's business; the store only needs them to tell an
/// activity apart from a plain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Create,
    Update,
    Delete,
    Follow,
    Accept,
    Reject,
    Add,
    Remove,
    Like,
    Announce,
    Undo,
    Block,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Create => "Create",
            ActivityKind::Update => "Update",
            ActivityKind::Delete => "Delete",
            ActivityKind::Follow => "Follow",
            ActivityKind::Accept => "Accept",
            ActivityKind::Reject => "Reject",
            ActivityKind::Add => "Add",
            ActivityKind::Remove => "Remove",
            ActivityKind::Like => "Like",
            ActivityKind::Announce => "Announce",
            ActivityKind::Undo => "Undo",
            ActivityKind::Block => "Block",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "Create" => ActivityKind::Create,
            "Update" => ActivityKind::Update,
            "Delete" => ActivityKind::Delete,
            "Follow" => ActivityKind::Follow,
            "Accept" => ActivityKind::Accept,
            "Reject" => ActivityKind::Reject,
            "Add" => ActivityKind::Add,
            "Remove" => ActivityKind::Remove,
            "Like" => ActivityKind::Like,
            "Announce" => ActivityKind::Announce,
            "Undo" => ActivityKind::Undo,
            "Block" => ActivityKind::Block,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    pub actor: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<Identifier>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    pub fn new(kind: ActivityKind, actor: impl Into<Reference>) -> Self {
        Self {
            kind,
            id: None,
            actor: actor.into(),
            object: None,
            target: None,
            to: Vec::new(),
            cc: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Addressable for Activity {
    fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    fn type_name(&self) -> &str {
        self.kind.as_str()
    }
}

impl Linked for Activity {
    fn references(&self) -> Vec<&Identifier> {
        let mut refs: Vec<&Identifier> = reference_ids(
            std::iter::once(&self.actor).chain(self.object.iter()).chain(self.target.iter()),
        )
        .collect();
        refs.extend(self.to.iter());
        refs.extend(self.cc.iter());
        refs
    }
}

/// Any other typed object (`Note`, `Image`, `Tombstone`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributed_to: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<Identifier>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Object {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            attributed_to: None,
            in_reply_to: None,
            to: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Addressable for Object {
    fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    fn type_name(&self) -> &str {
        &self.kind
    }
}

impl Linked for Object {
    fn references(&self) -> Vec<&Identifier> {
        let mut refs: Vec<&Identifier> =
            reference_ids(self.attributed_to.iter().chain(self.in_reply_to.iter())).collect();
        refs.extend(self.to.iter());
        refs
    }
}
