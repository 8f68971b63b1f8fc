//! Walking a stored DAG by path and reconstructing file bytes.

use crate::error::{Error, Result};
use crate::hash::{Hash, HashFunction};
use crate::object::{Link, Object, total_size};
use crate::store::KvStore;
use std::io::Write;
use tracing::{debug, trace};

/// Maximum nesting of lists inside lists.
pub const MAX_LIST_DEPTH: usize = 64;

/// Reads objects back out of a store.
pub struct DagResolver<'a, S: KvStore + ?Sized> {
    store: &'a S,
    verifier: Option<&'a dyn HashFunction>,
}

impl<'a, S: KvStore + ?Sized> DagResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            verifier: None,
        }
    }

    /// Re-hash every fetched object and reject any that don't match their key.
    pub fn verify_with(mut self, hasher: &'a dyn HashFunction) -> Self {
        self.verifier = Some(hasher);
        self
    }

    /// Fetch and decode one object.
    pub fn fetch(&self, hash: &Hash) -> Result<Object> {
        let bytes = self.store.get(hash)?;

        if let Some(hasher) = self.verifier {
            let computed = hasher.digest(&bytes);
            if computed != *hash {
                return Err(Error::encoding(format!(
                    "Hash mismatch: expected {}, got {}",
                    hash, computed
                )));
            }
        }

        Object::decode(&bytes)
    }

    /// Follow `path` from `root` and return the object it lands on.
    ///
    /// Segments are matched exactly against link names; empty segments are
    /// skipped, so `""` and `"/"` both name the root itself.
    pub fn lookup(&self, root: &Hash, path: &str) -> Result<(Hash, Object)> {
        let mut hash = *root;
        let mut object = self.fetch(root)?;

        for segment in path_segments(path) {
            hash = object
                .links()
                .iter()
                .find(|link| link.name() == segment)
                .map(|link| link.hash())
                .ok_or_else(|| Error::path_not_found(path, segment))?;
            trace!(segment, hash = %hash.short_hex(), "descending");
            object = self.fetch(&hash)?;
        }

        Ok((hash, object))
    }

    /// Reconstruct the bytes at `path` into a buffer.
    pub fn resolve(&self, root: &Hash, path: &str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.resolve_to_writer(root, path, &mut buf)?;
        Ok(buf)
    }

    /// Stream the bytes at `path` to `writer`, one blob at a time.
    ///
    /// Returns the number of bytes written. Failures of `writer` itself are
    /// reported as `Output` errors, never as store errors.
    pub fn resolve_to_writer<W: Write>(
        &self,
        root: &Hash,
        path: &str,
        mut writer: W,
    ) -> Result<u64> {
        debug!(root = %root, path, "resolving");
        let (_, object) = self.lookup(root, path)?;

        match object {
            Object::Blob(data) => {
                writer.write_all(&data).map_err(Error::output)?;
                Ok(data.len() as u64)
            }
            Object::List(links) => self.write_list(links, &mut writer),
            Object::Tree(_) => Err(Error::is_directory(path)),
        }
    }

    /// Concatenate the blobs under a list, depth-first in link order.
    fn write_list<W: Write>(&self, links: Vec<Link>, writer: &mut W) -> Result<u64> {
        let mut written = 0u64;
        let mut stack = vec![links.into_iter()];

        while let Some(top) = stack.last_mut() {
            let Some(link) = top.next() else {
                stack.pop();
                continue;
            };

            match self.fetch(&link.hash())? {
                Object::Blob(data) => {
                    if data.len() as u64 != link.size() {
                        return Err(size_mismatch(&link, data.len() as u64));
                    }
                    writer.write_all(&data).map_err(Error::output)?;
                    written += data.len() as u64;
                }
                Object::List(children) => {
                    let total = total_size(&children)?;
                    if total != link.size() {
                        return Err(size_mismatch(&link, total));
                    }
                    if stack.len() >= MAX_LIST_DEPTH {
                        return Err(Error::encoding(format!(
                            "List nesting deeper than {}",
                            MAX_LIST_DEPTH
                        )));
                    }
                    stack.push(children.into_iter());
                }
                Object::Tree(_) => {
                    return Err(Error::encoding(format!(
                        "List links to tree {}",
                        link.hash()
                    )));
                }
            }
        }

        Ok(written)
    }
}

/// Resolve `path` under `root` to its bytes.
pub fn resolve<S: KvStore + ?Sized>(store: &S, root: &Hash, path: &str) -> Result<Vec<u8>> {
    DagResolver::new(store).resolve(root, path)
}

fn size_mismatch(link: &Link, actual: u64) -> Error {
    Error::encoding(format!(
        "Chunk {} is {} bytes, link says {}",
        link.hash(),
        actual,
        link.size()
    ))
}

/// Non-empty segments of a slash-delimited path.
fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
