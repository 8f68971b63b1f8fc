//! DAG objects and their canonical binary encoding.
//!
//! Every object is a 16-byte header followed by the payload:
//!
//! ```text
//! 0x00  4   "MDAG" magic
//! 0x04  1   version (u8) = 1
//! 0x05  1   type: 1=blob, 2=list, 3=tree
//! 0x06  2   reserved (must be 0)
//! 0x08  8   payload_len (u64 LE)
//! 0x10  ... payload
//! ```
//!
//! A blob's payload is its raw data. List and tree payloads are a sequence
//! of link records:
//!
//! ```text
//! 32  hash
//!  8  size (u64 LE)
//!  2  name_len (u16 LE)
//!  N  name (UTF-8)
//! ```
//!
//! The encoding is the hash input, so two implementations that agree on
//! these bytes can share a store.

use crate::error::{Error, Result};
use crate::hash::{HASH_SIZE, Hash, HashFunction};
use serde::Serialize;

/// Magic bytes at the start of every encoded object.
pub const MAGIC: &[u8; 4] = b"MDAG";

/// Current object format version.
pub const VERSION: u8 = 1;

/// Size of the object header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Fixed part of a link record (hash + size + name_len).
const LINK_FIXED_SIZE: usize = HASH_SIZE + 8 + 2;

/// Object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    /// Raw file content (or one chunk of it).
    Blob = 1,
    /// Ordered chunks of one oversized file.
    List = 2,
    /// A directory.
    Tree = 3,
}

impl ObjectType {
    /// Convert to byte representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from byte representation.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(ObjectType::Blob),
            2 => Ok(ObjectType::List),
            3 => Ok(ObjectType::Tree),
            _ => Err(Error::encoding(format!("Invalid object type: {}", value))),
        }
    }

    /// Get the string name of this object type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::List => "list",
            ObjectType::Tree => "tree",
        }
    }
}

/// An edge from a parent object to a child.
///
/// Fields are private so every link is built through [`Link::named`] or
/// [`Link::chunk`], and a tree name always fits its `u16` length prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    name: String,
    hash: Hash,
    size: u64,
}

impl Link {
    /// Create a named link for a tree entry.
    pub fn named(name: impl Into<String>, hash: Hash, size: u64) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self { name, hash, size })
    }

    /// Create an unnamed chunk link for a list.
    pub fn chunk(hash: Hash, size: u64) -> Self {
        Self {
            name: String::new(),
            hash,
            size,
        }
    }

    /// Entry name; empty for chunk links inside a list.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Digest of the child object.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Logical byte length of the subtree behind this link.
    pub fn size(&self) -> u64 {
        self.size
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.hash.as_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        // Name length is bounded by validate_name
        buf.extend_from_slice(&(self.name.len() as u16).to_le_bytes());
        buf.extend_from_slice(self.name.as_bytes());
    }
}

/// Check that a tree entry name can be addressed by a slash-delimited path.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_link("Name cannot be empty"));
    }

    if name.len() > u16::MAX as usize {
        return Err(Error::invalid_link(format!(
            "Name too long: {} bytes (max {})",
            name.len(),
            u16::MAX
        )));
    }

    if name.contains('/') {
        return Err(Error::invalid_link(format!(
            "Name cannot contain '/': {:?}",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::invalid_link("Name cannot contain null bytes"));
    }

    Ok(())
}

/// The unit of storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    /// Leaf holding raw bytes.
    Blob(Vec<u8>),
    /// Unnamed links to the chunks of one file, in byte order.
    List(Vec<Link>),
    /// Named links to files and subdirectories.
    Tree(Vec<Link>),
}

impl Object {
    /// Type tag of this object.
    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Blob(_) => ObjectType::Blob,
            Object::List(_) => ObjectType::List,
            Object::Tree(_) => ObjectType::Tree,
        }
    }

    /// Outgoing links (empty for blobs).
    pub fn links(&self) -> &[Link] {
        match self {
            Object::Blob(_) => &[],
            Object::List(links) | Object::Tree(links) => links,
        }
    }

    /// Logical byte size of the content this object represents.
    ///
    /// Fails with `Encoding` if the link sizes of a decoded object add up
    /// past `u64::MAX`.
    pub fn logical_size(&self) -> Result<u64> {
        match self {
            Object::Blob(data) => Ok(data.len() as u64),
            Object::List(links) | Object::Tree(links) => total_size(links),
        }
    }

    /// Encode to the canonical byte representation.
    pub fn encode(&self) -> Vec<u8> {
        let payload_len = match self {
            Object::Blob(data) => data.len(),
            Object::List(links) | Object::Tree(links) => links
                .iter()
                .map(|l| LINK_FIXED_SIZE + l.name.len())
                .sum(),
        };

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload_len);

        // Magic (4 bytes)
        buf.extend_from_slice(MAGIC);

        // Version (1 byte)
        buf.push(VERSION);

        // Type (1 byte)
        buf.push(self.object_type().to_u8());

        // Reserved (2 bytes)
        buf.extend_from_slice(&[0, 0]);

        // Payload length (8 bytes, little-endian)
        buf.extend_from_slice(&(payload_len as u64).to_le_bytes());

        match self {
            Object::Blob(data) => buf.extend_from_slice(data),
            Object::List(links) | Object::Tree(links) => {
                for link in links {
                    link.encode_into(&mut buf);
                }
            }
        }

        buf
    }

    /// Encode and digest in one step.
    pub fn digest<H: HashFunction + ?Sized>(&self, hasher: &H) -> (Hash, Vec<u8>) {
        let bytes = self.encode();
        (hasher.digest(&bytes), bytes)
    }

    /// Decode an object from its canonical bytes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::encoding(format!(
                "Header too short: {} bytes (expected {})",
                buf.len(),
                HEADER_SIZE
            )));
        }

        if &buf[0..4] != MAGIC {
            return Err(Error::encoding(format!(
                "Invalid magic: expected {:?}, got {:?}",
                MAGIC,
                &buf[0..4]
            )));
        }

        let version = buf[4];
        if version != VERSION {
            return Err(Error::encoding(format!(
                "Unsupported version: {} (expected {})",
                version, VERSION
            )));
        }

        let object_type = ObjectType::from_u8(buf[5])?;

        if buf[6] != 0 || buf[7] != 0 {
            return Err(Error::encoding("Reserved bytes must be 0"));
        }

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&buf[8..16]);
        let payload_len = u64::from_le_bytes(len_bytes);

        let payload = &buf[HEADER_SIZE..];
        if payload.len() as u64 != payload_len {
            return Err(Error::encoding(format!(
                "Payload length mismatch: header says {}, got {}",
                payload_len,
                payload.len()
            )));
        }

        match object_type {
            ObjectType::Blob => Ok(Object::Blob(payload.to_vec())),
            ObjectType::List => {
                let links = decode_links(payload)?;
                if let Some(link) = links.iter().find(|l| !l.name.is_empty()) {
                    return Err(Error::encoding(format!(
                        "List link must be unnamed, found {:?}",
                        link.name
                    )));
                }
                Ok(Object::List(links))
            }
            ObjectType::Tree => {
                let links = decode_links(payload)?;
                for link in &links {
                    validate_name(&link.name)
                        .map_err(|e| Error::encoding(format!("Bad tree entry: {}", e)))?;
                }
                Ok(Object::Tree(links))
            }
        }
    }
}

/// Sum of the link sizes, checked for overflow.
pub(crate) fn total_size(links: &[Link]) -> Result<u64> {
    links.iter().try_fold(0u64, |total, link| {
        total
            .checked_add(link.size)
            .ok_or_else(|| Error::encoding("Link sizes overflow u64"))
    })
}

/// Decode a sequence of link records.
fn decode_links(mut payload: &[u8]) -> Result<Vec<Link>> {
    let mut links = Vec::new();

    while !payload.is_empty() {
        if payload.len() < LINK_FIXED_SIZE {
            return Err(Error::encoding(format!(
                "Truncated link record: {} bytes left",
                payload.len()
            )));
        }

        let mut hash_bytes = [0u8; HASH_SIZE];
        hash_bytes.copy_from_slice(&payload[..HASH_SIZE]);

        let mut size_bytes = [0u8; 8];
        size_bytes.copy_from_slice(&payload[HASH_SIZE..HASH_SIZE + 8]);

        let name_len =
            u16::from_le_bytes([payload[HASH_SIZE + 8], payload[HASH_SIZE + 9]]) as usize;

        let rest = &payload[LINK_FIXED_SIZE..];
        if rest.len() < name_len {
            return Err(Error::encoding(format!(
                "Truncated link name: need {} bytes, have {}",
                name_len,
                rest.len()
            )));
        }

        let name = std::str::from_utf8(&rest[..name_len])
            .map_err(|e| Error::encoding(format!("Invalid UTF-8 in link name: {}", e)))?
            .to_string();

        links.push(Link {
            name,
            hash: Hash::from_bytes(hash_bytes),
            size: u64::from_le_bytes(size_bytes),
        });

        payload = &rest[name_len..];
    }

    Ok(links)
}
