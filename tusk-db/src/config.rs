use crate::storage::StoreConfig;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// This node's hostname (`host` or `host:port`); decides locality
    pub hostname: String,
    /// Scheme for minted identifiers (default: https)
    pub scheme: String,
    /// Page size when a request names none (default: 20)
    pub default_page_size: usize,
    /// Upper bound on any requested page size (default: 100)
    pub max_page_size: usize,
    /// Collision retries before identifier minting gives up (default: 8)
    pub id_attempts: u32,
    /// Durable backend settings (None = in-memory only)
    pub storage: Option<StoreConfig>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            scheme: "https".to_string(),
            default_page_size: 20,
            max_page_size: 100,
            id_attempts: 8,
            storage: None,
        }
    }
}

impl DbConfig {
    /// In-memory config for `hostname`.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    /// Config for testing (in-memory, small pages so paging is exercised).
    pub fn for_testing(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            default_page_size: 5,
            max_page_size: 10,
            ..Self::default()
        }
    }

    /// Use the durable backend with the given settings.
    pub fn with_storage(mut self, storage: StoreConfig) -> Self {
        self.storage = Some(storage);
        self
    }
}
