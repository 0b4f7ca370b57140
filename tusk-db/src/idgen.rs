use tusk_core::Identifier;
use uuid::Uuid;

use crate::error::DbError;

/// Mints identifiers for new local documents:
/// `{scheme}://{hostname}/{type}/{uuid}`.
///
/// The path carries no meaning beyond uniqueness; the type segment only
/// keeps stored identifiers readable.
#[derive(Debug, Clone)]
pub struct IdentifierGenerator {
    scheme: String,
    hostname: String,
    max_attempts: u32,
}

impl IdentifierGenerator {
    pub fn new(scheme: impl Into<String>, hostname: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            scheme: scheme.into(),
            hostname: hostname.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Mint a fresh identifier for a document of `type_name`.
    ///
    /// `taken` reports identifiers already in use; a collision is retried
    /// with a new random component up to the configured number of times.
    pub fn mint(
        &self,
        type_name: &str,
        taken: impl Fn(&Identifier) -> bool,
    ) -> Result<Identifier, DbError> {
        let segment = type_segment(type_name);
        for attempt in 1..=self.max_attempts {
            let raw = format!(
                "{}://{}/{}/{}",
                self.scheme,
                self.hostname,
                segment,
                Uuid::new_v4().simple()
            );
            let id = Identifier::parse(&raw)?;
            if !taken(&id) {
                return Ok(id);
            }
            log::warn!("Minted identifier {id} already taken (attempt {attempt})");
        }
        Err(DbError::IdentifierExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Lowercased type name reduced to `[a-z0-9-]`.
fn type_segment(type_name: &str) -> String {
    let segment: String = type_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if segment.is_empty() {
        "objects".to_string()
    } else {
        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    #[test]
    fn test_mint_is_rooted_at_hostname() {
        let generator = IdentifierGenerator::new("https", "example.com", 4);
        let id = generator.mint("Note", |_| false).unwrap();
        assert_eq!(id.host(), "example.com");
        assert!(id.path().starts_with("/note/"));
    }

    #[test]
    fn test_mint_unique() {
        let generator = IdentifierGenerator::new("https", "example.com", 4);
        let ids: HashSet<Identifier> = (0..1000)
            .map(|_| generator.mint("Create", |_| false).unwrap())
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_mint_retries_collisions() {
        let generator = IdentifierGenerator::new("https", "example.com", 4);
        let calls = Cell::new(0);
        let id = generator
            .mint("Note", |_| {
                calls.set(calls.get() + 1);
                calls.get() < 3
            })
            .unwrap();
        assert_eq!(calls.get(), 3);
        assert!(id.path().starts_with("/note/"));
    }

    #[test]
    fn test_mint_exhausted() {
        let generator = IdentifierGenerator::new("https", "example.com", 3);
        assert_eq!(
            generator.mint("Note", |_| true),
            Err(DbError::IdentifierExhausted { attempts: 3 })
        );
    }

    #[test]
    fn test_type_segment() {
        assert_eq!(type_segment("OrderedCollection"), "orderedcollection");
        assert_eq!(type_segment("../x y"), "xy");
        assert_eq!(type_segment(""), "objects");
    }
}
