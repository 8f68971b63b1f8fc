//! Turning files and directories into stored DAG objects.

use crate::chunking::{ChunkerConfig, split};
use crate::error::Result;
use crate::hash::{Hash, HashFunction};
use crate::node::{Directory, File, Node};
use crate::object::{Link, Object};
use crate::store::KvStore;
use std::{mem, slice};
use tracing::{debug, info, trace};

/// Writes nodes into a store as a Merkle DAG.
///
/// Objects are stored post-order: nothing is written before every object it
/// links to is already present. Each write is preceded by a `has` check, so
/// identical content anywhere in any build is stored once.
pub struct DagBuilder<'a, S: KvStore + ?Sized, H: HashFunction + ?Sized> {
    store: &'a S,
    hasher: &'a H,
    chunker: ChunkerConfig,
}

/// One directory whose children are still being built.
struct Frame<'n> {
    dir: &'n Directory,
    children: slice::Iter<'n, Node>,
    links: Vec<Link>,
}

impl<'n> Frame<'n> {
    fn new(dir: &'n Directory) -> Self {
        Self {
            dir,
            children: dir.children(),
            links: Vec::with_capacity(dir.len()),
        }
    }
}

impl<'a, S: KvStore + ?Sized, H: HashFunction + ?Sized> DagBuilder<'a, S, H> {
    /// Create a builder with the default chunker settings.
    pub fn new(store: &'a S, hasher: &'a H) -> Self {
        Self {
            store,
            hasher,
            chunker: ChunkerConfig::default(),
        }
    }

    /// Use a custom chunker configuration.
    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn chunker(&self) -> &ChunkerConfig {
        &self.chunker
    }

    /// Build a file or directory and return the root digest.
    ///
    /// A store error aborts the build. Objects already written stay in the
    /// store; a retry re-derives the same hashes and skips them.
    pub fn build(&self, node: &Node) -> Result<Hash> {
        let hash = match node {
            Node::File(file) => self.build_file(file)?,
            Node::Directory(dir) => self.build_directory(dir)?,
        };
        info!(root = %hash, name = node.name(), size = node.size(), "build complete");
        Ok(hash)
    }

    /// Build raw bytes as an anonymous file.
    pub fn build_bytes(&self, data: &[u8]) -> Result<Hash> {
        self.build_content(data)
    }

    fn build_file(&self, file: &File) -> Result<Hash> {
        self.build_content(&file.bytes()?)
    }

    fn build_content(&self, data: &[u8]) -> Result<Hash> {
        if !self.chunker.needs_split(data.len()) {
            return self.put_object(&Object::Blob(data.to_vec()));
        }

        let chunks = split(data, self.chunker.threshold)?;
        let mut links = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let hash = self.put_object(&Object::Blob(chunk.to_vec()))?;
            links.push(Link::chunk(hash, chunk.len() as u64));
        }

        self.put_object(&Object::List(links))
    }

    /// Build a directory tree with an explicit stack of open directories.
    fn build_directory(&self, root: &Directory) -> Result<Hash> {
        let mut parents: Vec<Frame> = Vec::new();
        let mut current = Frame::new(root);

        loop {
            match current.children.next() {
                Some(Node::File(file)) => {
                    let hash = self.build_file(file)?;
                    current.links.push(Link::named(file.name(), hash, file.size())?);
                }
                Some(Node::Directory(dir)) => {
                    parents.push(mem::replace(&mut current, Frame::new(dir)));
                }
                None => {
                    let dir = current.dir;
                    let hash = self.put_object(&Object::Tree(mem::take(&mut current.links)))?;
                    let Some(parent) = parents.pop() else {
                        return Ok(hash);
                    };
                    current = parent;
                    current.links.push(Link::named(dir.name(), hash, dir.size())?);
                }
            }
        }
    }

    /// Encode, hash and insert an object if absent.
    fn put_object(&self, object: &Object) -> Result<Hash> {
        let (hash, bytes) = object.digest(self.hasher);

        if self.store.has(&hash)? {
            trace!(
                hash = %hash.short_hex(),
                kind = object.object_type().as_str(),
                "already stored"
            );
            return Ok(hash);
        }

        self.store.put(&hash, &bytes)?;
        debug!(
            hash = %hash.short_hex(),
            kind = object.object_type().as_str(),
            bytes = bytes.len(),
            "stored object"
        );
        Ok(hash)
    }
}

/// Build `node` into `store` with the default chunker settings.
pub fn build<S, H>(node: &Node, store: &S, hasher: &H) -> Result<Hash>
where
    S: KvStore + ?Sized,
    H: HashFunction + ?Sized,
{
    DagBuilder::new(store, hasher).build(node)
}
