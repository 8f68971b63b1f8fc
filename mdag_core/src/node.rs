//! Source trees handed to the builder.

use crate::error::Result;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Kind of a source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    File,
    Directory,
}

/// A file or directory to be added to the DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(File),
    Directory(Directory),
}

impl Node {
    /// Entry name of the node.
    pub fn name(&self) -> &str {
        match self {
            Node::File(file) => file.name(),
            Node::Directory(dir) => dir.name(),
        }
    }

    /// Logical byte size: file length, or the sum over a directory's children.
    pub fn size(&self) -> u64 {
        match self {
            Node::File(file) => file.size(),
            Node::Directory(dir) => dir.size(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::File(_) => NodeType::File,
            Node::Directory(_) => NodeType::Directory,
        }
    }
}

impl From<File> for Node {
    fn from(file: File) -> Self {
        Node::File(file)
    }
}

impl From<Directory> for Node {
    fn from(dir: Directory) -> Self {
        Node::Directory(dir)
    }
}

/// A named file.
///
/// Content is either held in memory or read from disk on demand, so a walked
/// tree only costs its metadata until the builder reaches each file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    name: String,
    content: Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Inline(Vec<u8>),
    OnDisk { path: PathBuf, len: u64 },
}

impl File {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: Content::Inline(content.into()),
        }
    }

    /// A file whose `len` bytes are read from `path` when needed.
    pub fn on_disk(name: impl Into<String>, path: impl Into<PathBuf>, len: u64) -> Self {
        Self {
            name: name.into(),
            content: Content::OnDisk {
                path: path.into(),
                len,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file content.
    ///
    /// On-disk files are read on every call. A file whose length no longer
    /// matches the recorded size is a `Store` error, since the directory
    /// sizes above it were computed from that size.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match &self.content {
            Content::Inline(data) => Ok(Cow::Borrowed(data)),
            Content::OnDisk { path, len } => {
                let data = fs::read(path)?;
                if data.len() as u64 != *len {
                    return Err(io::Error::other(format!(
                        "{} changed size from {} to {} bytes",
                        path.display(),
                        len,
                        data.len()
                    ))
                    .into());
                }
                Ok(Cow::Owned(data))
            }
        }
    }

    pub fn size(&self) -> u64 {
        match &self.content {
            Content::Inline(data) => data.len() as u64,
            Content::OnDisk { len, .. } => *len,
        }
    }
}

/// A named directory with its children in iteration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    name: String,
    children: Vec<Node>,
    size: u64,
}

impl Directory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            size: 0,
        }
    }

    /// Build a directory from children, keeping their order.
    pub fn with_children(
        name: impl Into<String>,
        children: impl IntoIterator<Item = Node>,
    ) -> Self {
        let mut dir = Self::new(name);
        for child in children {
            dir.push(child);
        }
        dir
    }

    /// Append a child.
    pub fn push(&mut self, child: impl Into<Node>) {
        let child = child.into();
        self.size += child.size();
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Children in the order they will be linked into the tree.
    pub fn children(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}
