use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tusk_core::{Addressable, Document, Identifier, OrderedCollection, OrderedCollectionPage};

use crate::collection::{OrderedCollectionManager, PageParams};
use crate::config::DbConfig;
use crate::error::DbError;
use crate::linkage::ActorLinkage;
use crate::lock::IdentifierLock;
use crate::store::ResourceStore;

/// The whole persistence core behind one cloneable handle.
///
/// Every mutation and every read-modify-write sequence is expected to be
/// bracketed by `lock`/`unlock` on the identifiers involved:
///
/// ```ignore
/// db.lock(&outbox, &cancel).await?;
/// let mut page = db.get_outbox(&outbox)?;
/// page.ordered_items.insert(0, activity.into());
/// let result = db.set_outbox(&page);
/// db.unlock(&outbox)?;
/// result?;
/// ```
#[derive(Clone)]
pub struct Database {
    config: Arc<DbConfig>,
    locks: Arc<IdentifierLock>,
    store: Arc<ResourceStore>,
    collections: Arc<OrderedCollectionManager>,
    linkage: Arc<ActorLinkage>,
}

impl Database {
    /// Open the database described by `config`.
    pub fn open(config: DbConfig) -> Result<Self, DbError> {
        let store = Arc::new(ResourceStore::open(&config)?);
        let collections = Arc::new(OrderedCollectionManager::new(store.clone(), &config));
        let linkage = Arc::new(ActorLinkage::new(store.clone(), collections.clone()));

        log::info!(
            "Database open for {} ({})",
            config.hostname,
            if config.storage.is_some() { "rocksdb" } else { "in-memory" }
        );

        Ok(Self {
            config: Arc::new(config),
            locks: Arc::new(IdentifierLock::new()),
            store,
            collections,
            linkage,
        })
    }

    /// In-memory database for `hostname` with default settings.
    pub fn in_memory(hostname: impl Into<String>) -> Result<Self, DbError> {
        Self::open(DbConfig::new(hostname))
    }

    // ---- locking ----

    pub async fn lock(&self, id: &Identifier, cancel: &CancellationToken) -> Result<(), DbError> {
        self.locks.acquire(id, cancel).await
    }

    pub async fn lock_timeout(&self, id: &Identifier, timeout: Duration) -> Result<(), DbError> {
        self.locks.acquire_timeout(id, timeout).await
    }

    /// Release a lock taken by this same context. Cross-context release is
    /// unsupported; see [`IdentifierLock::release`].
    pub fn unlock(&self, id: &Identifier) -> Result<(), DbError> {
        self.locks.release(id)
    }

    /// Lock several identifiers in the global order. Returns them in the
    /// order they were locked.
    pub async fn lock_all(
        &self,
        ids: &[Identifier],
        cancel: &CancellationToken,
    ) -> Result<Vec<Identifier>, DbError> {
        self.locks.acquire_all(ids, cancel).await
    }

    pub fn unlock_all(&self, ids: &[Identifier]) -> Result<(), DbError> {
        self.locks.release_all(ids)
    }

    // ---- documents ----

    pub fn owns(&self, id: &Identifier) -> bool {
        self.store.owns(id)
    }

    pub fn exists(&self, id: &Identifier) -> bool {
        self.store.exists(id)
    }

    pub fn get(&self, id: &Identifier) -> Result<Document, DbError> {
        self.store.get(id)
    }

    pub fn create(&self, document: Document) -> Result<(), DbError> {
        self.store.create(document)
    }

    pub fn update(&self, document: Document) -> Result<(), DbError> {
        self.store.update(document)
    }

    pub fn delete(&self, id: &Identifier) -> Result<(), DbError> {
        self.store.delete(id)
    }

    /// A fresh local identifier for `document`, named after its type.
    pub fn new_id(&self, document: &Document) -> Result<Identifier, DbError> {
        self.store.new_id(document.type_name())
    }

    pub fn new_id_for(&self, type_name: &str) -> Result<Identifier, DbError> {
        self.store.new_id(type_name)
    }

    // ---- collections ----

    pub fn contains(&self, collection: &Identifier, item: &Identifier) -> Result<bool, DbError> {
        self.collections.contains(collection, item)
    }

    /// Whether `item` was already delivered to `inbox`.
    pub fn inbox_contains(&self, inbox: &Identifier, item: &Identifier) -> Result<bool, DbError> {
        self.collections.contains(inbox, item)
    }

    pub fn get_collection(&self, id: &Identifier) -> Result<OrderedCollection, DbError> {
        self.collections.load(id)
    }

    pub fn get_page(
        &self,
        collection: &Identifier,
        params: PageParams,
    ) -> Result<OrderedCollectionPage, DbError> {
        self.collections.get_page(collection, params)
    }

    pub fn set_page(
        &self,
        collection: &Identifier,
        page: &OrderedCollectionPage,
    ) -> Result<(), DbError> {
        self.collections.set_page(collection, page).map(|_| ())
    }

    pub fn get_inbox(&self, inbox: &Identifier) -> Result<OrderedCollectionPage, DbError> {
        self.collections.get_inbox(inbox)
    }

    pub fn set_inbox(&self, page: &OrderedCollectionPage) -> Result<(), DbError> {
        self.collections.set_inbox(page).map(|_| ())
    }

    pub fn get_outbox(&self, outbox: &Identifier) -> Result<OrderedCollectionPage, DbError> {
        self.collections.get_outbox(outbox)
    }

    pub fn set_outbox(&self, page: &OrderedCollectionPage) -> Result<(), DbError> {
        self.collections.set_outbox(page).map(|_| ())
    }

    // ---- actor linkage ----

    pub fn actor_for_inbox(&self, inbox: &Identifier) -> Result<Identifier, DbError> {
        self.linkage.actor_for_inbox(inbox)
    }

    pub fn actor_for_outbox(&self, outbox: &Identifier) -> Result<Identifier, DbError> {
        self.linkage.actor_for_outbox(outbox)
    }

    pub fn outbox_for_inbox(&self, inbox: &Identifier) -> Result<Identifier, DbError> {
        self.linkage.outbox_for_inbox(inbox)
    }

    pub fn followers(&self, actor: &Identifier) -> Result<OrderedCollection, DbError> {
        self.linkage.followers(actor)
    }

    pub fn following(&self, actor: &Identifier) -> Result<OrderedCollection, DbError> {
        self.linkage.following(actor)
    }

    pub fn liked(&self, actor: &Identifier) -> Result<OrderedCollection, DbError> {
        self.linkage.liked(actor)
    }

    // ---- components ----

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn locks(&self) -> &Arc<IdentifierLock> {
        &self.locks
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.store
    }

    pub fn collections(&self) -> &Arc<OrderedCollectionManager> {
        &self.collections
    }

    pub fn linkage(&self) -> &Arc<ActorLinkage> {
        &self.linkage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tusk_core::{Activity, ActivityKind, Actor, ActorKind, Object, Reference};

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_post_into_outbox() {
        let db = Database::open(DbConfig::for_testing("example.com")).unwrap();
        let actor =
            Actor::with_standard_collections(ActorKind::Person, id("https://example.com/users/a"));
        let actor_id = actor.id.clone().unwrap();
        db.create(Document::from(actor.clone())).unwrap();

        let mut note = Object::new("Note");
        note.id = Some(db.new_id_for("Note").unwrap());
        let mut create = Activity::new(ActivityKind::Create, actor_id.clone());
        create.object = Some(Reference::from(Document::from(note)));
        let create = Document::from(create);
        let activity_id = db.new_id(&create).unwrap();
        assert!(activity_id.path().starts_with("/create/"));

        let cancel = CancellationToken::new();
        db.lock(&actor.outbox, &cancel).await.unwrap();
        let mut page = db.get_outbox(&actor.outbox).unwrap();
        page.ordered_items.insert(0, Reference::from(activity_id.clone()));
        db.set_outbox(&page).unwrap();
        db.unlock(&actor.outbox).unwrap();

        assert!(db.contains(&actor.outbox, &activity_id).unwrap());
        assert_eq!(db.actor_for_outbox(&actor.outbox).unwrap(), actor_id);
        assert_eq!(db.get_collection(&actor.outbox).unwrap().total_items, Some(1));
    }

    #[tokio::test]
    async fn test_clones_share_store_and_lock_registry() {
        let db = Database::in_memory("example.com").unwrap();
        let other = db.clone();
        let target = id("https://example.com/notes/1");

        let mut note = Object::new("Note");
        note.id = Some(target.clone());
        db.create(Document::from(note)).unwrap();
        assert!(other.exists(&target));

        // Released by the acquiring handle; other clones only observe it
        let cancel = CancellationToken::new();
        db.lock(&target, &cancel).await.unwrap();
        assert!(other.locks().is_locked(&target));
        db.unlock(&target).unwrap();
        assert!(!other.locks().is_locked(&target));
        assert_eq!(other.unlock(&target), Err(DbError::LockNotHeld(target.clone())));
    }
}
