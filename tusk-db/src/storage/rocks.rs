//! RocksDB-backed durable content backend.
//!
//! Column families:
//! - `content`  — Documents as JSON, LZ4 compressed, keyed by identifier
//! - `metadata` — Entry metadata (bincode: locality, timestamps, sizes)
//!
//! Both are written in one `WriteBatch`, so an entry is never visible with
//! content but no metadata or the reverse.

use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamilyDescriptor, DBCompressionType, DBWithThreadMode,
    IteratorMode, Options, SingleThreaded, WriteBatch, WriteOptions,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tusk_core::{codec, Identifier};

use super::{ContentBackend, ContentEntry};
use crate::error::DbError;

/// Column family names.
const CF_CONTENT: &str = "content";
const CF_METADATA: &str = "metadata";

/// All column family names for initialization.
const COLUMN_FAMILIES: &[&str] = &[CF_CONTENT, CF_METADATA];

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database directory path
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Bloom filter bits per key (default: 10)
    pub bloom_filter_bits: i32,
    /// Enable fsync on every write (default: false)
    pub sync_writes: bool,
    /// Max open files for RocksDB (default: 512)
    pub max_open_files: i32,
    /// Write buffer size per column family (default: 32MB)
    pub write_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tusk_data"),
            block_cache_size: 64 * 1024 * 1024,
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 512,
            write_buffer_size: 32 * 1024 * 1024,
        }
    }
}

impl StoreConfig {
    /// Config at `path` with defaults otherwise.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create config for testing (small caches).
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 64,
            write_buffer_size: 4 * 1024 * 1024,
        }
    }
}

/// Metadata stored alongside each document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Canonical identifier
    pub id: String,
    pub is_local: bool,
    /// Creation timestamp (seconds since epoch)
    pub created_at: u64,
    /// Last modified timestamp (seconds since epoch)
    pub updated_at: u64,
    /// Uncompressed JSON size in bytes
    pub size: u64,
    /// Compressed size in bytes
    pub compressed_size: u64,
}

impl EntryMetadata {
    fn encode(&self) -> Result<Vec<u8>, DbError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| DbError::SerializationError(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, DbError> {
        let (meta, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| DbError::DeserializationError(e.to_string()))?;
        Ok(meta)
    }
}

/// RocksDB content backend.
pub struct RocksBackend {
    /// RocksDB instance (single-threaded CF mode; reads and writes are
    /// thread-safe)
    db: DBWithThreadMode<SingleThreaded>,
    config: StoreConfig,
}

impl RocksBackend {
    /// Open the backend at the configured path, creating the database and
    /// column families if they don't exist.
    pub fn open(config: StoreConfig) -> Result<Self, DbError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.set_keep_log_file_num(5);
        db_opts.increase_parallelism(num_cpus());

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Self::cf_options(name, &config)))
            .collect();

        let db = DBWithThreadMode::<SingleThreaded>::open_cf_descriptors(
            &db_opts,
            &config.path,
            cf_descriptors,
        )?;

        log::info!("Opened content store at {}", config.path.display());
        Ok(Self { db, config })
    }

    /// Build column-family-specific options.
    fn cf_options(name: &str, config: &StoreConfig) -> Options {
        let mut opts = Options::default();

        let mut block_opts = BlockBasedOptions::default();
        let cache = Cache::new_lru_cache(config.block_cache_size);
        block_opts.set_block_cache(&cache);
        block_opts.set_bloom_filter(config.bloom_filter_bits as f64, false);
        opts.set_block_based_table_factory(&block_opts);
        opts.set_write_buffer_size(config.write_buffer_size);

        match name {
            CF_CONTENT => {
                // Values are already LZ4 compressed
                opts.set_compression_type(DBCompressionType::None);
                opts.optimize_for_point_lookup(config.block_cache_size as u64);
            }
            CF_METADATA => {
                opts.set_compression_type(DBCompressionType::Lz4);
                opts.optimize_for_point_lookup(config.block_cache_size as u64);
            }
            _ => {}
        }

        opts
    }

    /// Load only the metadata for an identifier.
    pub fn load_metadata(&self, id: &Identifier) -> Result<Option<EntryMetadata>, DbError> {
        let cf = self.cf(CF_METADATA)?;
        match self.db.get_cf(cf, id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(EntryMetadata::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Force a flush of memtables to disk.
    pub fn sync(&self) -> Result<(), DbError> {
        self.db.flush()?;
        Ok(())
    }

    /// Get the database path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn load_with(&self, key: &[u8], meta: EntryMetadata) -> Result<ContentEntry, DbError> {
        let cf = self.cf(CF_CONTENT)?;
        let compressed = self
            .db
            .get_cf(cf, key)?
            .ok_or_else(|| DbError::StorageError(format!("Content missing for {}", meta.id)))?;
        let json = lz4_flex::decompress_size_prepended(&compressed)
            .map_err(|e| DbError::CompressionError(e.to_string()))?;
        let document = codec::decode(&json)?;
        Ok(ContentEntry {
            id: Identifier::parse(&meta.id)?,
            document,
            is_local: meta.is_local,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, DbError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| DbError::StorageError(format!("Column family '{name}' not found")))
    }

    fn write_opts(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }
}

impl ContentBackend for RocksBackend {
    fn load(&self, id: &Identifier) -> Result<Option<ContentEntry>, DbError> {
        match self.load_metadata(id)? {
            Some(meta) => Ok(Some(self.load_with(id.as_str().as_bytes(), meta)?)),
            None => Ok(None),
        }
    }

    fn save(&self, entry: &ContentEntry) -> Result<(), DbError> {
        let cf_content = self.cf(CF_CONTENT)?;
        let cf_meta = self.cf(CF_METADATA)?;

        let json = codec::encode(&entry.document)?;
        let compressed = lz4_flex::compress_prepend_size(&json);
        let meta = EntryMetadata {
            id: entry.id.as_str().to_string(),
            is_local: entry.is_local,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            size: json.len() as u64,
            compressed_size: compressed.len() as u64,
        };

        // Atomic batch write: content + metadata
        let key = entry.id.as_str().as_bytes();
        let mut batch = WriteBatch::default();
        batch.put_cf(cf_content, key, &compressed);
        batch.put_cf(cf_meta, key, meta.encode()?);
        self.db.write_opt(batch, &self.write_opts())?;
        Ok(())
    }

    fn remove(&self, id: &Identifier) -> Result<Option<ContentEntry>, DbError> {
        let previous = self.load(id)?;
        if previous.is_none() {
            return Ok(None);
        }

        let key = id.as_str().as_bytes();
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_CONTENT)?, key);
        batch.delete_cf(self.cf(CF_METADATA)?, key);
        self.db.write_opt(batch, &self.write_opts())?;
        Ok(previous)
    }

    fn contains(&self, id: &Identifier) -> Result<bool, DbError> {
        let cf = self.cf(CF_METADATA)?;
        Ok(self.db.get_cf(cf, id.as_str().as_bytes())?.is_some())
    }

    fn entries(&self) -> Result<Vec<ContentEntry>, DbError> {
        let cf = self.cf(CF_METADATA)?;
        let mut entries = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let meta = EntryMetadata::decode(&value)?;
            entries.push(self.load_with(&key, meta)?);
        }
        Ok(entries)
    }

    fn len(&self) -> Result<usize, DbError> {
        let cf = self.cf(CF_METADATA)?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

/// Get number of CPU cores for RocksDB parallelism.
fn num_cpus() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as i32)
        .unwrap_or(4)
}
