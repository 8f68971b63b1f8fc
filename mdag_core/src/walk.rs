//! Loading files and directories from disk into [`Node`] trees.

use crate::error::{Error, Result};
use crate::node::{Directory, File, Node};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a file or directory into a [`Node`].
///
/// Only metadata is read here. File content stays on disk until the builder
/// asks for it, one file at a time.
///
/// Directories are walked with the `ignore` crate: hidden files are included,
/// `.gitignore` rules are honoured, and children are ordered by file name so
/// the same tree always builds to the same hash. Symlinks and other special
/// files are rejected.
pub fn load_path(path: &Path) -> Result<Node> {
    let metadata = fs::symlink_metadata(path)?;
    let name = path
        .file_name()
        .map(|n| file_name_str(n, path))
        .transpose()?
        .unwrap_or_default();

    if metadata.is_file() {
        return Ok(File::on_disk(name, path, metadata.len()).into());
    }
    if !metadata.is_dir() {
        return Err(Error::unsupported_file_type(path));
    }

    let walker = ignore::WalkBuilder::new(path)
        .hidden(false) // Include hidden files
        .git_ignore(true) // Respect .gitignore
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    // Directories still being filled, outermost first
    let mut open: Vec<Directory> = Vec::new();

    for entry in walker {
        let entry = entry?;
        let depth = entry.depth();

        // Close every directory that is not an ancestor of this entry
        while open.len() > depth {
            close_top(&mut open);
        }

        let file_type = entry
            .file_type()
            .ok_or_else(|| Error::unsupported_file_type(entry.path()))?;

        if depth == 0 {
            open.push(Directory::new(name.clone()));
            continue;
        }

        let entry_name = file_name_str(entry.file_name(), entry.path())?;
        if file_type.is_dir() {
            open.push(Directory::new(entry_name));
        } else if file_type.is_file() {
            let len = entry.metadata()?.len();
            if let Some(parent) = open.last_mut() {
                parent.push(File::on_disk(entry_name, entry.path(), len));
            }
        } else {
            return Err(Error::unsupported_file_type(entry.path()));
        }
    }

    while open.len() > 1 {
        close_top(&mut open);
    }

    let root = open
        .pop()
        .ok_or_else(|| Error::invalid_store(path, "walker yielded no entries"))?;
    debug!(path = %path.display(), entries = root.len(), size = root.size(), "loaded directory");
    Ok(root.into())
}

/// Move the innermost open directory into its parent.
fn close_top(open: &mut Vec<Directory>) {
    if let Some(done) = open.pop() {
        if let Some(parent) = open.last_mut() {
            parent.push(done);
        }
    }
}

fn file_name_str(name: &std::ffi::OsStr, path: &Path) -> Result<String> {
    name.to_str()
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_link(format!("Non UTF-8 file name: {}", path.display())))
}
