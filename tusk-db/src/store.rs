//! The addressable-document table.
//!
//! One [`ContentEntry`] per identifier. `create` and `update` are both
//! upserts; the store does not self-lock, so callers bracket
//! read-modify-write sequences with the identifier lock.

use tusk_core::{Addressable, Document, Identifier};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::idgen::IdentifierGenerator;
use crate::index::LinkageIndex;
use crate::ownership::OwnershipResolver;
use crate::storage::{now_secs, ContentBackend, ContentEntry, MemoryBackend, RocksBackend};

pub struct ResourceStore {
    backend: Box<dyn ContentBackend>,
    ownership: OwnershipResolver,
    generator: IdentifierGenerator,
    index: LinkageIndex,
}

impl ResourceStore {
    /// Build a store over `backend`, rebuilding the linkage index from
    /// whatever the backend already holds.
    pub fn with_backend(
        backend: Box<dyn ContentBackend>,
        config: &DbConfig,
    ) -> Result<Self, DbError> {
        let index = LinkageIndex::new();
        let existing = backend.entries()?;
        for entry in &existing {
            index.record(entry, None);
        }
        if !existing.is_empty() {
            log::info!(
                "Recovered {} documents ({} local actors indexed)",
                existing.len(),
                index.len()
            );
        }

        Ok(Self {
            backend,
            ownership: OwnershipResolver::new(config.hostname.clone()),
            generator: IdentifierGenerator::new(
                config.scheme.clone(),
                config.hostname.clone(),
                config.id_attempts,
            ),
            index,
        })
    }

    /// Open the backend named by `config.storage` (in-memory when unset).
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let backend: Box<dyn ContentBackend> = match &config.storage {
            Some(storage) => Box::new(RocksBackend::open(storage.clone())?),
            None => Box::new(MemoryBackend::new()),
        };
        Self::with_backend(backend, config)
    }

    /// Whether a document is stored at `id`. Backend failures are logged
    /// and read as absence.
    pub fn exists(&self, id: &Identifier) -> bool {
        match self.backend.contains(id) {
            Ok(exists) => exists,
            Err(e) => {
                log::error!("Existence check for {id} failed: {e}");
                false
            }
        }
    }

    pub fn get(&self, id: &Identifier) -> Result<Document, DbError> {
        self.entry(id).map(|entry| entry.document)
    }

    /// The full stored entry, including locality and timestamps.
    pub fn entry(&self, id: &Identifier) -> Result<ContentEntry, DbError> {
        self.backend
            .load(id)?
            .ok_or_else(|| DbError::NotFound(id.clone()))
    }

    /// Store a new document under its own identifier.
    pub fn create(&self, document: Document) -> Result<(), DbError> {
        let id = self.upsert(document)?;
        log::debug!("Created {id}");
        Ok(())
    }

    /// Overwrite the document under its own identifier. Identical to
    /// `create`; actors' followers/following/liked collections are
    /// conventionally introduced this way.
    pub fn update(&self, document: Document) -> Result<(), DbError> {
        let id = self.upsert(document)?;
        log::debug!("Updated {id}");
        Ok(())
    }

    /// Remove the document at `id`. Absent identifiers are a no-op.
    pub fn delete(&self, id: &Identifier) -> Result<(), DbError> {
        if let Some(previous) = self.backend.remove(id)? {
            self.index.forget(&previous);
            log::debug!("Deleted {id}");
        }
        Ok(())
    }

    fn upsert(&self, document: Document) -> Result<Identifier, DbError> {
        let id = document.id().cloned().ok_or_else(|| {
            DbError::InvalidDocument(format!("{} carries no id", document.type_name()))
        })?;
        // Would read back as another variant from a serializing backend
        if !document.is_well_typed() {
            return Err(DbError::InvalidDocument(format!(
                "{id}: `{}` is reserved and cannot be stored as a plain object",
                document.type_name()
            )));
        }

        let previous = self.backend.load(&id)?;
        let entry = match &previous {
            // Locality and creation time are fixed at first write
            Some(previous) => ContentEntry {
                id: id.clone(),
                document,
                is_local: previous.is_local,
                created_at: previous.created_at,
                updated_at: now_secs(),
            },
            None => {
                let is_local = self.ownership.owns(&id);
                ContentEntry::new(id.clone(), document, is_local)
            }
        };

        self.backend.save(&entry)?;
        self.index.record(&entry, previous.as_ref());
        Ok(id)
    }

    pub fn owns(&self, id: &Identifier) -> bool {
        self.ownership.owns(id)
    }

    pub fn ownership(&self) -> &OwnershipResolver {
        &self.ownership
    }

    /// Mint an identifier for a new local document of `type_name` that
    /// collides with nothing stored.
    pub fn new_id(&self, type_name: &str) -> Result<Identifier, DbError> {
        self.generator.mint(type_name, |id| self.exists(id))
    }

    pub fn linkage_index(&self) -> &LinkageIndex {
        &self.index
    }

    pub fn len(&self) -> Result<usize, DbError> {
        self.backend.len()
    }

    pub fn is_empty(&self) -> Result<bool, DbError> {
        Ok(self.len()? == 0)
    }
}
