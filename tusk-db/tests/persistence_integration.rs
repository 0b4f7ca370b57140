//! Persistence integration tests.
//!
//! Verifies:
//! - Documents survive a close/reopen of the RocksDB backend unchanged
//! - Locality tags and creation times are kept across restarts
//! - The reverse linkage index is rebuilt on open
//! - Deletes and page merges are durable
//! - Memory and RocksDB backends behave identically

use tempfile::tempdir;
use tusk_core::{decode, Actor, ActorKind, Document, Identifier, Object, Reference};
use tusk_db::{
    CancellationToken, ContentBackend, Database, DbConfig, DbError, PageParams, RocksBackend,
    StoreConfig,
};

fn id(s: &str) -> Identifier {
    Identifier::parse(s).unwrap()
}

fn durable(path: &std::path::Path) -> DbConfig {
    DbConfig::for_testing("example.com").with_storage(StoreConfig::for_testing(path))
}

const REMOTE_NOTE: &str = r##"{
    "@context": "https://www.w3.org/ns/activitystreams",
    "type": "Note",
    "id": "https://remote.example/notes/42",
    "attributedTo": "https://remote.example/users/b",
    "content": "hello from afar",
    "tag": [{"type": "Hashtag", "name": "#rust"}]
}"##;

// ─── Restart survival ────────────────────────────────────────────────────────

#[test]
fn test_documents_survive_reopen() {
    let dir = tempdir().unwrap();
    let actor =
        Actor::with_standard_collections(ActorKind::Person, id("https://example.com/users/a"));
    let remote = decode(REMOTE_NOTE.as_bytes()).unwrap();

    let created_at = {
        let db = Database::open(durable(dir.path())).unwrap();
        db.create(Document::from(actor.clone())).unwrap();
        db.create(remote.clone()).unwrap();
        db.store()
            .entry(actor.id.as_ref().unwrap())
            .unwrap()
            .created_at
    };

    let db = Database::open(durable(dir.path())).unwrap();
    assert_eq!(db.get(actor.id.as_ref().unwrap()).unwrap(), Document::from(actor.clone()));
    assert_eq!(db.get(&id("https://remote.example/notes/42")).unwrap(), remote);

    let local = db.store().entry(actor.id.as_ref().unwrap()).unwrap();
    assert!(local.is_local);
    assert_eq!(local.created_at, created_at);
    assert!(!db.store().entry(&id("https://remote.example/notes/42")).unwrap().is_local);
}

#[test]
fn test_linkage_index_rebuilt_on_open() {
    let dir = tempdir().unwrap();
    let actor =
        Actor::with_standard_collections(ActorKind::Person, id("https://example.com/users/a"));
    {
        let db = Database::open(durable(dir.path())).unwrap();
        db.create(Document::from(actor.clone())).unwrap();
    }

    let db = Database::open(durable(dir.path())).unwrap();
    assert_eq!(db.actor_for_inbox(&actor.inbox).unwrap(), actor.id.clone().unwrap());
    assert_eq!(db.outbox_for_inbox(&actor.inbox).unwrap(), actor.outbox);
}

#[test]
fn test_delete_is_durable() {
    let dir = tempdir().unwrap();
    let target = id("https://example.com/notes/1");
    {
        let db = Database::open(durable(dir.path())).unwrap();
        let mut note = Object::new("Note");
        note.id = Some(target.clone());
        db.create(Document::from(note)).unwrap();
        db.delete(&target).unwrap();
        db.delete(&target).unwrap();
    }

    let db = Database::open(durable(dir.path())).unwrap();
    assert!(!db.exists(&target));
    assert_eq!(db.get(&target), Err(DbError::NotFound(target.clone())));
}

#[tokio::test]
async fn test_page_merge_is_durable() {
    let dir = tempdir().unwrap();
    let outbox = id("https://example.com/users/a/outbox");
    {
        let db = Database::open(durable(dir.path())).unwrap();
        db.lock(&outbox, &CancellationToken::new()).await.unwrap();
        for n in 0..3 {
            let mut page = db.get_outbox(&outbox).unwrap();
            page.ordered_items
                .insert(0, Reference::from(id(&format!("https://example.com/activities/{n}"))));
            db.set_outbox(&page).unwrap();
        }
        db.unlock(&outbox).unwrap();
    }

    let db = Database::open(durable(dir.path())).unwrap();
    let page = db.get_page(&outbox, PageParams::first(5)).unwrap();
    let paths: Vec<&str> = page.ordered_items.iter().map(|r| r.id().unwrap().path()).collect();
    assert_eq!(paths, ["/activities/2", "/activities/1", "/activities/0"]);
    assert_eq!(page.total_items, Some(3));
}

#[test]
fn test_metadata_tracks_sizes() {
    let dir = tempdir().unwrap();
    let backend = RocksBackend::open(StoreConfig::for_testing(dir.path())).unwrap();
    let remote = decode(REMOTE_NOTE.as_bytes()).unwrap();
    let note_id = id("https://remote.example/notes/42");
    backend
        .save(&tusk_db::ContentEntry::new(note_id.clone(), remote, false))
        .unwrap();

    let meta = backend.load_metadata(&note_id).unwrap().unwrap();
    assert_eq!(meta.id, note_id.as_str());
    assert!(!meta.is_local);
    assert!(meta.size > 0);
    assert!(meta.compressed_size > 0);
}

// ─── Backend equivalence ─────────────────────────────────────────────────────

fn scenario(db: &Database) -> Vec<Document> {
    let actor =
        Actor::with_standard_collections(ActorKind::Group, id("https://example.com/groups/g"));
    db.create(Document::from(actor.clone())).unwrap();
    db.create(decode(REMOTE_NOTE.as_bytes()).unwrap()).unwrap();

    let mut renamed = actor.clone();
    renamed.preferred_username = Some("g".to_string());
    db.update(Document::from(renamed)).unwrap();

    let mut page = db.get_inbox(&actor.inbox).unwrap();
    page.ordered_items.push(Reference::from(id("https://remote.example/notes/42")));
    db.set_inbox(&page).unwrap();

    [
        actor.id.clone().unwrap(),
        actor.inbox.clone(),
        id("https://remote.example/notes/42"),
    ]
    .iter()
    .map(|i| db.get(i).unwrap())
    .collect()
}

#[test]
fn test_memory_and_rocks_agree() {
    let dir = tempdir().unwrap();
    let memory = Database::open(DbConfig::for_testing("example.com")).unwrap();
    let rocks = Database::open(durable(dir.path())).unwrap();
    assert_eq!(scenario(&memory), scenario(&rocks));
    assert_eq!(memory.store().len().unwrap(), rocks.store().len().unwrap());
}

#[test]
fn test_backends_refuse_objects_with_reserved_types() {
    let dir = tempdir().unwrap();
    let memory = Database::open(DbConfig::for_testing("example.com")).unwrap();
    let rocks = Database::open(durable(dir.path())).unwrap();
    let target = id("https://example.com/things/1");

    for db in [&memory, &rocks] {
        let mut collection = Object::new("OrderedCollection");
        collection.id = Some(target.clone());
        let result = db.create(Document::from(collection));
        assert!(matches!(result, Err(DbError::InvalidDocument(_))));
        assert!(!db.exists(&target));

        let mut note = Object::new("Note");
        note.id = Some(target.clone());
        db.create(Document::from(note.clone())).unwrap();
        assert_eq!(db.get(&target).unwrap(), Document::from(note));
    }
}
