use tusk_core::{Document, Identifier};

use crate::shard::ShardedMap;
use crate::storage::ContentEntry;

/// Reverse index from a local actor's inbox and outbox to the actor.
///
/// Kept in step with every store write so reverse linkage lookups never
/// scan. Federated actors are not indexed.
pub struct LinkageIndex {
    inbox_to_actor: ShardedMap<Identifier, Identifier>,
    outbox_to_actor: ShardedMap<Identifier, Identifier>,
}

impl LinkageIndex {
    pub fn new() -> Self {
        Self {
            inbox_to_actor: ShardedMap::new(),
            outbox_to_actor: ShardedMap::new(),
        }
    }

    /// Reflect an overwrite of `previous` (if any) by `current`.
    pub fn record(&self, current: &ContentEntry, previous: Option<&ContentEntry>) {
        if let Some(previous) = previous {
            self.forget(previous);
        }
        if let Some((inbox, outbox)) = local_boxes(current) {
            self.inbox_to_actor.insert(inbox.clone(), current.id.clone());
            self.outbox_to_actor.insert(outbox.clone(), current.id.clone());
        }
    }

    /// Drop the mappings contributed by `entry`.
    pub fn forget(&self, entry: &ContentEntry) {
        if let Some((inbox, outbox)) = local_boxes(entry) {
            // Only remove mappings that still point at this actor
            if self.inbox_to_actor.get(inbox).as_ref() == Some(&entry.id) {
                self.inbox_to_actor.remove(inbox);
            }
            if self.outbox_to_actor.get(outbox).as_ref() == Some(&entry.id) {
                self.outbox_to_actor.remove(outbox);
            }
        }
    }

    pub fn actor_for_inbox(&self, inbox: &Identifier) -> Option<Identifier> {
        self.inbox_to_actor.get(inbox)
    }

    pub fn actor_for_outbox(&self, outbox: &Identifier) -> Option<Identifier> {
        self.outbox_to_actor.get(outbox)
    }

    /// Number of indexed actors.
    pub fn len(&self) -> usize {
        self.inbox_to_actor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inbox_to_actor.is_empty()
    }
}

impl Default for LinkageIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn local_boxes(entry: &ContentEntry) -> Option<(&Identifier, &Identifier)> {
    match &entry.document {
        Document::Actor(actor) if entry.is_local => Some((&actor.inbox, &actor.outbox)),
        _ => None,
    }
}
