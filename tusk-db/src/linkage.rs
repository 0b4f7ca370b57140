//! Actor ↔ inbox ↔ outbox ↔ {followers, following, liked}.
//!
//! Forward lookups read the actor document. Reverse lookups only work for
//! actors this node owns and go through the store's linkage index.

use std::sync::Arc;

use tusk_core::{Actor, CollectionProperty, Document, Identifier, OrderedCollection, Reference};

use crate::collection::OrderedCollectionManager;
use crate::error::DbError;
use crate::store::ResourceStore;

pub struct ActorLinkage {
    store: Arc<ResourceStore>,
    collections: Arc<OrderedCollectionManager>,
}

impl ActorLinkage {
    pub fn new(store: Arc<ResourceStore>, collections: Arc<OrderedCollectionManager>) -> Self {
        Self { store, collections }
    }

    /// The actor document stored at `id`.
    pub fn actor(&self, id: &Identifier) -> Result<Actor, DbError> {
        match self.store.get(id)? {
            Document::Actor(actor) => Ok(actor),
            other => Err(DbError::InvalidDocument(format!(
                "{id} is a {:?}, not an actor",
                other.kind()
            ))),
        }
    }

    pub fn followers(&self, actor: &Identifier) -> Result<OrderedCollection, DbError> {
        self.collection(actor, CollectionProperty::Followers)
    }

    pub fn following(&self, actor: &Identifier) -> Result<OrderedCollection, DbError> {
        self.collection(actor, CollectionProperty::Following)
    }

    pub fn liked(&self, actor: &Identifier) -> Result<OrderedCollection, DbError> {
        self.collection(actor, CollectionProperty::Liked)
    }

    /// Resolve one of the actor's collection properties. An embedded
    /// collection is returned as written; a link is loaded from the store.
    pub fn collection(
        &self,
        actor_id: &Identifier,
        property: CollectionProperty,
    ) -> Result<OrderedCollection, DbError> {
        let actor = self.actor(actor_id)?;
        let reference = actor
            .collection(property)
            .ok_or_else(|| DbError::MissingCollection {
                actor: actor_id.clone(),
                property,
            })?;

        match reference {
            Reference::Embedded(doc) => match doc.as_ordered_collection() {
                Some(collection) => Ok(collection.clone()),
                None => self.load_linked(actor_id, property, reference),
            },
            Reference::Id(id) => self.collections.load(id),
        }
    }

    // An embedded non-collection that still names an id is followed as a link
    fn load_linked(
        &self,
        actor_id: &Identifier,
        property: CollectionProperty,
        reference: &Reference,
    ) -> Result<OrderedCollection, DbError> {
        match reference.id() {
            Some(id) => self.collections.load(id),
            None => Err(DbError::InvalidDocument(format!(
                "{property} of {actor_id} is neither a collection nor a link"
            ))),
        }
    }

    pub fn actor_for_inbox(&self, inbox: &Identifier) -> Result<Identifier, DbError> {
        self.ensure_local(inbox)?;
        self.store
            .linkage_index()
            .actor_for_inbox(inbox)
            .ok_or_else(|| DbError::NotFound(inbox.clone()))
    }

    pub fn actor_for_outbox(&self, outbox: &Identifier) -> Result<Identifier, DbError> {
        self.ensure_local(outbox)?;
        self.store
            .linkage_index()
            .actor_for_outbox(outbox)
            .ok_or_else(|| DbError::NotFound(outbox.clone()))
    }

    pub fn outbox_for_inbox(&self, inbox: &Identifier) -> Result<Identifier, DbError> {
        let actor = self.actor_for_inbox(inbox)?;
        Ok(self.actor(&actor)?.outbox)
    }

    fn ensure_local(&self, id: &Identifier) -> Result<(), DbError> {
        if self.store.owns(id) {
            Ok(())
        } else {
            Err(DbError::UnsupportedLocality(id.clone()))
        }
    }
}
