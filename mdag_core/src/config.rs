//! Store configuration file.
//!
//! Persisted as `key=value` lines in `<store>/config`:
//!
//! ```text
//! version=1
//! algo=blake3-256
//! chunk_threshold=262144
//! ```

use crate::chunking::{ChunkerConfig, DEFAULT_CHUNK_THRESHOLD};
use crate::error::{Error, Result};
use crate::hash::Algorithm;

/// Current config file version.
pub const CONFIG_VERSION: u32 = 1;

/// Settings a store is bound to for its whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Hash algorithm used to address objects.
    pub algorithm: Algorithm,
    /// Chunker settings used when building files into this store.
    pub chunker: ChunkerConfig,
}

impl StoreConfig {
    /// Create a config, validating the chunk threshold.
    pub fn new(algorithm: Algorithm, chunk_threshold: usize) -> Result<Self> {
        Ok(Self {
            algorithm,
            chunker: ChunkerConfig::new(chunk_threshold)?,
        })
    }

    /// Render the config file contents.
    pub fn to_file_string(&self) -> String {
        format!(
            "version={}\nalgo={}\nchunk_threshold={}\n",
            CONFIG_VERSION,
            self.algorithm.as_str(),
            self.chunker.threshold
        )
    }

    /// Parse config file contents.
    pub fn parse(content: &str) -> Result<Self> {
        let mut version = None;
        let mut algo = None;
        let mut threshold = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "version" => version = Some(value.trim()),
                    "algo" => algo = Some(value.trim()),
                    "chunk_threshold" => threshold = Some(value.trim()),
                    _ => {}
                }
            }
        }

        if version != Some("1") {
            return Err(Error::invalid_config(format!(
                "Unsupported config version: {:?}",
                version
            )));
        }

        let algo_str = algo.ok_or_else(|| Error::invalid_config("Missing algo in config"))?;
        let algorithm = Algorithm::parse(algo_str)?;

        let chunk_threshold = match threshold {
            Some(s) => s.parse::<usize>().map_err(|e| {
                Error::invalid_config(format!("Invalid chunk_threshold {:?}: {}", s, e))
            })?,
            None => DEFAULT_CHUNK_THRESHOLD,
        };

        Self::new(algorithm, chunk_threshold)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            chunker: ChunkerConfig::default(),
        }
    }
}
