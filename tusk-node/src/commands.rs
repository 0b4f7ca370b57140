use clap::Subcommand;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tusk_core::{
    encode_pretty, Activity, ActivityKind, Actor, ActorKind, CollectionProperty, Document,
    Identifier, Object, OrderedCollection, Reference,
};
use tusk_db::{Database, DbError, PageParams};

type CommandResult = Result<String, Box<dyn std::error::Error>>;

const PUBLIC: &str = "https://www.w3.org/ns/activitystreams#Public";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision a local actor with inbox, outbox and collections
    Register {
        username: String,
        /// Register an automated (Service) actor
        #[arg(long)]
        service: bool,
    },
    /// Post a public note to an actor's outbox
    Post { username: String, text: String },
    /// Record `follower` as following a local actor
    Follow { username: String, follower: String },
    /// Print the document stored at an IRI
    Show { iri: String },
    /// Print one page of a collection
    Page {
        collection: String,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Find the actor owning an inbox or outbox
    Whois { iri: String },
}

pub async fn run(db: &Database, command: Command, cancel: &CancellationToken) -> CommandResult {
    match command {
        Command::Register { username, service } => {
            let kind = if service { ActorKind::Service } else { ActorKind::Person };
            register(db, &username, kind, cancel).await
        }
        Command::Post { username, text } => post(db, &username, &text, cancel).await,
        Command::Follow { username, follower } => {
            follow(db, &username, &Identifier::parse(&follower)?, cancel).await
        }
        Command::Show { iri } => Ok(encode_pretty(&db.get(&Identifier::parse(&iri)?)?)?),
        Command::Page {
            collection,
            offset,
            limit,
        } => {
            let limit = limit.unwrap_or(db.config().default_page_size);
            let collection = Identifier::parse(&collection)?;
            let page = db.get_page(&collection, PageParams::new(offset, limit))?;
            Ok(encode_pretty(&Document::from(page))?)
        }
        Command::Whois { iri } => whois(db, &Identifier::parse(&iri)?),
    }
}

fn actor_id(db: &Database, username: &str) -> Result<Identifier, DbError> {
    let config = db.config();
    let raw = format!("{}://{}/users/{}", config.scheme, config.hostname, username);
    Ok(Identifier::parse(&raw)?)
}

fn collection_id(actor: &Actor, property: CollectionProperty) -> Result<Identifier, DbError> {
    actor
        .collection(property)
        .and_then(Reference::id)
        .cloned()
        .ok_or_else(|| DbError::MissingCollection {
            actor: actor.id.clone().unwrap_or_else(|| actor.inbox.clone()),
            property,
        })
}

/// Run `f` holding every lock in `ids`; the locks are released whatever
/// `f` returns.
async fn with_locks<T>(
    db: &Database,
    ids: &[Identifier],
    cancel: &CancellationToken,
    f: impl FnOnce() -> Result<T, DbError>,
) -> Result<T, DbError> {
    let held = db.lock_all(ids, cancel).await?;
    let result = f();
    db.unlock_all(&held)?;
    result
}

async fn register(
    db: &Database,
    username: &str,
    kind: ActorKind,
    cancel: &CancellationToken,
) -> CommandResult {
    let id = actor_id(db, username)?;
    let mut actor = Actor::with_standard_collections(kind, id.clone());
    actor.preferred_username = Some(username.to_string());

    let collections = [
        CollectionProperty::Followers,
        CollectionProperty::Following,
        CollectionProperty::Liked,
    ]
    .iter()
    .map(|p| collection_id(&actor, *p))
    .collect::<Result<Vec<_>, _>>()?;

    let mut ids = vec![id.clone(), actor.inbox.clone(), actor.outbox.clone()];
    ids.extend(collections.iter().cloned());

    with_locks(db, &ids, cancel, || {
        if db.exists(&id) {
            return Err(DbError::InvalidDocument(format!("{id} is already registered")));
        }
        db.create(Document::from(actor.clone()))?;
        // Actor collections are introduced by update
        for collection in &collections {
            db.update(Document::from(OrderedCollection::new(collection.clone())))?;
        }
        Ok(())
    })
    .await?;

    log::info!("Registered {id}");
    Ok(encode_pretty(&Document::from(actor))?)
}

async fn post(
    db: &Database,
    username: &str,
    text: &str,
    cancel: &CancellationToken,
) -> CommandResult {
    let id = actor_id(db, username)?;
    let actor = db.linkage().actor(&id)?;
    let public = Identifier::parse(PUBLIC)?;
    let followers = collection_id(&actor, CollectionProperty::Followers).ok();

    let mut note = Object::new("Note");
    note.id = Some(db.new_id_for("Note")?);
    note.attributed_to = Some(Reference::from(id.clone()));
    note.to = vec![public.clone()];
    note.extra.insert("content".to_string(), Value::from(text));
    let note_id = note.id.clone().ok_or("minted note has no id")?;

    let mut create = Activity::new(ActivityKind::Create, id.clone());
    create.id = Some(db.new_id_for(ActivityKind::Create.as_str())?);
    create.object = Some(Reference::from(note_id.clone()));
    create.to = vec![public];
    create.cc = followers.into_iter().collect();
    let create_id = create.id.clone().ok_or("minted activity has no id")?;

    let ids = [note_id, create_id.clone(), actor.outbox.clone()];
    with_locks(db, &ids, cancel, || {
        db.create(Document::from(note))?;
        db.create(Document::from(create))?;
        let mut page = db.get_outbox(&actor.outbox)?;
        page.ordered_items.insert(0, Reference::from(create_id.clone()));
        db.set_outbox(&page)
    })
    .await?;

    log::info!("{id} posted {create_id}");
    Ok(create_id.to_string())
}

async fn follow(
    db: &Database,
    username: &str,
    follower: &Identifier,
    cancel: &CancellationToken,
) -> CommandResult {
    let id = actor_id(db, username)?;
    let actor = db.linkage().actor(&id)?;
    let followers = collection_id(&actor, CollectionProperty::Followers)?;

    let added = with_locks(db, std::slice::from_ref(&followers), cancel, || {
        if db.contains(&followers, follower)? {
            return Ok(false);
        }
        let mut page = db.get_page(&followers, PageParams::first(db.config().default_page_size))?;
        page.ordered_items.insert(0, Reference::from(follower.clone()));
        db.set_page(&followers, &page)?;
        Ok(true)
    })
    .await?;

    if added {
        Ok(format!("{follower} now follows {id}"))
    } else {
        Ok(format!("{follower} already follows {id}"))
    }
}

fn whois(db: &Database, iri: &Identifier) -> CommandResult {
    match db.actor_for_inbox(iri) {
        Ok(actor) => {
            let outbox = db.outbox_for_inbox(iri)?;
            Ok(format!("{actor} (inbox; outbox {outbox})"))
        }
        Err(DbError::NotFound(_)) => {
            let actor = db.actor_for_outbox(iri)?;
            Ok(format!("{actor} (outbox)"))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tusk_db::DbConfig;

    fn db() -> Database {
        Database::open(DbConfig::for_testing("example.com")).unwrap()
    }

    fn register_cmd(username: &str) -> Command {
        Command::Register {
            username: username.to_string(),
            service: false,
        }
    }

    #[tokio::test]
    async fn test_register_provisions_collections() {
        let db = db();
        let cancel = CancellationToken::new();
        run(&db, register_cmd("alice"), &cancel).await.unwrap();

        let alice = Identifier::parse("https://example.com/users/alice").unwrap();
        assert!(db.exists(&alice));
        assert!(db.exists(&alice.child("followers")));
        assert!(db.exists(&alice.child("liked")));
        assert!(db.followers(&alice).unwrap().is_empty());
        assert!(!db.locks().is_locked(&alice));

        assert!(run(&db, register_cmd("alice"), &cancel).await.is_err());
        assert!(!db.locks().is_locked(&alice));
    }

    #[tokio::test]
    async fn test_post_prepends_to_outbox() {
        let db = db();
        let cancel = CancellationToken::new();
        run(&db, register_cmd("alice"), &cancel).await.unwrap();

        let post = |text: &str| Command::Post {
            username: "alice".into(),
            text: text.into(),
        };
        let first = run(&db, post("one"), &cancel).await.unwrap();
        let second = run(&db, post("two"), &cancel).await.unwrap();

        let outbox = Identifier::parse("https://example.com/users/alice/outbox").unwrap();
        let items: Vec<String> = db
            .get_collection(&outbox)
            .unwrap()
            .ordered_items
            .iter()
            .map(|r| r.id().unwrap().to_string())
            .collect();
        assert_eq!(items, [second.clone(), first]);

        let create = db.get(&Identifier::parse(&second).unwrap()).unwrap();
        assert_eq!(create.kind(), tusk_core::DocumentKind::Activity);
    }

    #[tokio::test]
    async fn test_follow_is_deduplicated() {
        let db = db();
        let cancel = CancellationToken::new();
        run(&db, register_cmd("alice"), &cancel).await.unwrap();

        let follow = || Command::Follow {
            username: "alice".into(),
            follower: "https://remote.example/users/bob".into(),
        };
        let first = run(&db, follow(), &cancel).await.unwrap();
        let second = run(&db, follow(), &cancel).await.unwrap();
        assert!(first.contains("now follows"));
        assert!(second.contains("already follows"));

        let alice = Identifier::parse("https://example.com/users/alice").unwrap();
        assert_eq!(db.followers(&alice).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_whois() {
        let db = db();
        let cancel = CancellationToken::new();
        run(&db, register_cmd("alice"), &cancel).await.unwrap();

        let inbox = Command::Whois { iri: "https://example.com/users/alice/inbox".into() };
        let out = run(&db, inbox, &cancel).await.unwrap();
        assert!(out.starts_with("https://example.com/users/alice (inbox"));

        let outbox = Command::Whois { iri: "https://example.com/users/alice/outbox".into() };
        assert!(run(&db, outbox, &cancel).await.unwrap().ends_with("(outbox)"));

        let remote = Command::Whois { iri: "https://remote.example/users/bob/inbox".into() };
        assert!(run(&db, remote, &cancel).await.is_err());
    }
}
