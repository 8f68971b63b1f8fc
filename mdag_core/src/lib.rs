//! # mdag Core
//!
//! A content-addressed Merkle DAG over files and directories.
//!
//! Files at or below the chunk threshold become a single blob; larger files
//! are split into fixed-size chunks referenced by a list. Directories become
//! trees of named links. Every object is stored once under the digest of its
//! canonical encoding, and any file can be read back from a root hash and a
//! slash-delimited path.
//!
//! ## Features
//!
//! - Deterministic binary object encoding with an explicit type tag
//! - Pluggable hash function (BLAKE3 and SHA-256 built in)
//! - Dedup at every insertion point, so identical subtrees are shared
//! - Post-order construction: a stored parent never dangles
//! - In-memory and on-disk stores behind one `KvStore` trait
//!
//! ## Example
//!
//! ```no_run
//! use mdag_core::{Algorithm, DagBuilder, DagResolver, FileStore, StoreConfig, load_path};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileStore::init("./my-store", StoreConfig::default())?;
//! let algorithm = store.config().algorithm;
//!
//! let node = load_path(Path::new("./my-data"))?;
//! let root = DagBuilder::new(&store, &algorithm)
//!     .with_chunker(store.config().chunker)
//!     .build(&node)?;
//!
//! let bytes = DagResolver::new(&store).resolve(&root, "docs/readme.md")?;
//! println!("{} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

mod builder;
mod chunking;
mod config;
mod error;
mod hash;
mod node;
mod object;
mod resolver;
mod store;
mod walk;

pub use builder::{DagBuilder, build};
pub use chunking::{ChunkerConfig, DEFAULT_CHUNK_THRESHOLD, split};
pub use config::StoreConfig;
pub use error::{Error, ErrorKind, Result};
pub use hash::{Algorithm, HASH_SIZE, Hash, HashFunction};
pub use node::{Directory, File, Node, NodeType};
pub use object::{Link, Object, ObjectType};
pub use resolver::{DagResolver, MAX_LIST_DEPTH, resolve};
pub use store::{FileStore, KvStore, MemoryStore};
pub use walk::load_path;
