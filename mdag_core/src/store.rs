//! Content-addressed key-value stores.
//!
//! The DAG code only needs the [`KvStore`] contract. Two backends ship with
//! the crate: [`MemoryStore`] for tests and embedding, and [`FileStore`] for
//! an on-disk store laid out as `objects/{algorithm}/{prefix}/{suffix}`.

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::hash::Hash;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::trace;

/// Compression threshold: stored values >= 4KB are compressed on disk.
const COMPRESSION_THRESHOLD: usize = 4096;

/// On-disk codec prefix for uncompressed values.
const CODEC_RAW: u8 = 0;

/// On-disk codec prefix for zstd-compressed values.
const CODEC_ZSTD: u8 = 1;

/// A content-addressable blob store keyed by digest.
///
/// Values under a key never change, so every method takes `&self` and must be
/// safe to call from several threads at once. Two racing `put`s for the same
/// hash carry the same bytes and either may win.
pub trait KvStore: Send + Sync {
    /// Whether a value is stored under `hash`.
    fn has(&self, hash: &Hash) -> Result<bool>;

    /// Fetch the value under `hash`. Fails with `ObjectNotFound` if absent.
    fn get(&self, hash: &Hash) -> Result<Vec<u8>>;

    /// Store `data` under `hash`. Writing an existing key is a no-op in effect.
    fn put(&self, hash: &Hash, data: &[u8]) -> Result<()>;
}

/// In-memory, HashMap-based store.
///
/// All values are held behind a `RwLock`. A poisoned lock is recovered, since
/// the map is insert-only and can't be left half-updated.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<Hash, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values currently stored.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of all stored hashes.
    pub fn hashes(&self) -> Vec<Hash> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut hashes: Vec<Hash> = map.keys().copied().collect();
        hashes.sort();
        hashes
    }
}

impl KvStore for MemoryStore {
    fn has(&self, hash: &Hash) -> Result<bool> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.contains_key(hash))
    }

    fn get(&self, hash: &Hash) -> Result<Vec<u8>> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        map.get(hash)
            .cloned()
            .ok_or_else(|| Error::object_not_found(hash.to_hex()))
    }

    fn put(&self, hash: &Hash, data: &[u8]) -> Result<()> {
        let mut map = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(*hash).or_insert_with(|| data.to_vec());
        Ok(())
    }
}

/// An on-disk store.
///
/// Directory structure:
/// - `config` with version, algorithm and chunk threshold
/// - `objects/{algorithm}/{prefix}/{suffix}` one file per value
///
/// Each file starts with a codec byte (0 = raw, 1 = zstd) followed by the
/// value. Values are written to a tempfile and renamed into place.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    config: StoreConfig,
}

impl FileStore {
    /// Initialize a new store at the given path.
    pub fn init<P: AsRef<Path>>(root: P, config: StoreConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        let config_path = root.join("config");
        if config_path.exists() {
            return Err(Error::invalid_store(&root, "store already initialized"));
        }

        // Create objects directory with algorithm subdirectory
        let objects_dir = root.join("objects").join(config.algorithm.as_str());
        fs::create_dir_all(&objects_dir)?;

        fs::write(&config_path, config.to_file_string())?;

        Ok(Self { root, config })
    }

    /// Open an existing store at the given path.
    ///
    /// Validates the store structure and reads the configuration.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(Error::invalid_store(&root, "directory does not exist"));
        }

        let config_path = root.join("config");
        if !config_path.exists() {
            return Err(Error::invalid_store(&root, "config file not found"));
        }

        let config = StoreConfig::parse(&fs::read_to_string(&config_path)?)?;

        let objects_dir = root.join("objects").join(config.algorithm.as_str());
        if !objects_dir.exists() {
            return Err(Error::invalid_store(
                &root,
                "objects directory structure missing",
            ));
        }

        Ok(Self { root, config })
    }

    /// Get the path to an object file given its hash.
    ///
    /// Returns: `objects/{algorithm}/{prefix}/{suffix}`
    pub fn object_path(&self, hash: &Hash) -> PathBuf {
        self.root
            .join("objects")
            .join(self.config.algorithm.as_str())
            .join(hash.prefix())
            .join(hash.suffix())
    }

    /// Get the root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the configuration this store was initialized with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Write a file atomically using tempfile.
    fn write_atomic(&self, path: &Path, codec: u8, payload: &[u8]) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::invalid_store(&self.root, "object path has no parent"))?;
        fs::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(&[codec])?;
        temp_file.write_all(payload)?;
        temp_file.flush()?;
        temp_file.persist(path)?;

        Ok(())
    }
}

impl KvStore for FileStore {
    fn has(&self, hash: &Hash) -> Result<bool> {
        Ok(self.object_path(hash).try_exists()?)
    }

    fn get(&self, hash: &Hash) -> Result<Vec<u8>> {
        let path = self.object_path(hash);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::object_not_found(hash.to_hex()));
            }
            Err(e) => return Err(e.into()),
        };

        let (codec, payload) = raw.split_first().ok_or_else(|| {
            Error::encoding(format!("Empty object file: {}", path.display()))
        })?;

        match *codec {
            CODEC_RAW => Ok(payload.to_vec()),
            CODEC_ZSTD => zstd::decode_all(payload)
                .map_err(|e| Error::encoding(format!("zstd decompression failed: {}", e))),
            other => Err(Error::encoding(format!(
                "Unknown codec {} in {}",
                other,
                path.display()
            ))),
        }
    }

    fn put(&self, hash: &Hash, data: &[u8]) -> Result<()> {
        let path = self.object_path(hash);
        if path.try_exists()? {
            return Ok(());
        }

        if data.len() >= COMPRESSION_THRESHOLD {
            let compressed = zstd::encode_all(data, 3)?; // Level 3 = fast compression
            trace!(
                hash = %hash.short_hex(),
                raw = data.len(),
                compressed = compressed.len(),
                "writing compressed value"
            );
            self.write_atomic(&path, CODEC_ZSTD, &compressed)
        } else {
            trace!(hash = %hash.short_hex(), raw = data.len(), "writing value");
            self.write_atomic(&path, CODEC_RAW, data)
        }
    }
}
