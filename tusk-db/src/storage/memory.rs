use tusk_core::Identifier;

use super::{ContentBackend, ContentEntry};
use crate::error::DbError;
use crate::shard::ShardedMap;

/// In-memory backend. Nothing survives the process.
pub struct MemoryBackend {
    content: ShardedMap<Identifier, ContentEntry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            content: ShardedMap::new(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentBackend for MemoryBackend {
    fn load(&self, id: &Identifier) -> Result<Option<ContentEntry>, DbError> {
        Ok(self.content.get(id))
    }

    fn save(&self, entry: &ContentEntry) -> Result<(), DbError> {
        self.content.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, id: &Identifier) -> Result<Option<ContentEntry>, DbError> {
        Ok(self.content.remove(id))
    }

    fn contains(&self, id: &Identifier) -> Result<bool, DbError> {
        Ok(self.content.contains_key(id))
    }

    fn entries(&self) -> Result<Vec<ContentEntry>, DbError> {
        Ok(self.content.values())
    }

    fn len(&self) -> Result<usize, DbError> {
        Ok(self.content.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tusk_core::{Document, Object};

    fn note(s: &str) -> (Identifier, Document) {
        let id = Identifier::parse(s).unwrap();
        let mut object = Object::new("Note");
        object.id = Some(id.clone());
        (id, Document::from(object))
    }

    #[test]
    fn test_memory_backend_crud() {
        let backend = MemoryBackend::new();
        let (id, doc) = note("https://example.com/notes/1");
        assert!(!backend.contains(&id).unwrap());

        let entry = ContentEntry::new(id.clone(), doc, true);
        backend.save(&entry).unwrap();
        assert!(backend.contains(&id).unwrap());
        assert_eq!(backend.load(&id).unwrap(), Some(entry.clone()));
        assert_eq!(backend.len().unwrap(), 1);
        assert_eq!(backend.entries().unwrap(), vec![entry.clone()]);

        assert_eq!(backend.remove(&id).unwrap(), Some(entry));
        assert_eq!(backend.remove(&id).unwrap(), None);
        assert_eq!(backend.load(&id).unwrap(), None);
    }
}
