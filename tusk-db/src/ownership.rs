use tusk_core::Identifier;

/// Decides whether an identifier belongs to this node.
///
/// An identifier is local iff its `host[:port]` equals the configured
/// hostname, compared case-insensitively. Anything else is a federated
/// peer's.
#[derive(Debug, Clone)]
pub struct OwnershipResolver {
    hostname: String,
}

impl OwnershipResolver {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into().to_ascii_lowercase(),
        }
    }

    pub fn owns(&self, id: &Identifier) -> bool {
        id.authority().eq_ignore_ascii_case(&self.hostname)
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}
