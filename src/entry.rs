use std::ffi::OsString;
use std::fs::{self, FileType};
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

use crate::error::FindError;

/// A single candidate produced by the [`Walker`](crate::walker::Walker).
///
/// Built from the directory listing alone, so constructing one never costs a
/// `stat()`. Anything the listing cannot provide lives in
/// [`ExtendedMetadata`] and is fetched lazily by the query.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Full path: the parent directory (separator-terminated) followed by
    /// the entry name. The root keeps the path it was given.
    pub path: PathBuf,

    /// Raw file name as listed by the parent directory.
    pub name: OsString,

    /// Entry type as reported by the listing. Symlinks are never followed.
    pub kind: EntryKind,

    /// How deep in the traversal this entry was found. Root = 0.
    pub depth: usize,

    /// Inode number from the listing itself. `None` for the root, which has
    /// no parent listing record.
    pub ino: Option<u64>,
}

impl Entry {
    /// Whether this candidate is the walk root rather than a listed child.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

/// The kind of a traversed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link, pipe, socket, device node.
    Other,

    /// The listing could not tell.
    Unknown,
}

impl EntryKind {
    pub(crate) fn from_file_type(ft: FileType) -> Self {
        if ft.is_dir() {
            EntryKind::Dir
        } else if ft.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// Per-file status that only a full `stat()` can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedMetadata {
    pub size: u64,
    pub nlink: u64,
    pub ino: u64,
}

impl ExtendedMetadata {
    /// Fetch metadata for `entry`.
    ///
    /// Listed children are queried without following symlinks so the answer
    /// agrees with the listing's own inode and type. The root is resolved
    /// through symlinks, the same way it was validated.
    pub fn fetch(entry: &Entry) -> Result<Self, FindError> {
        let result = if entry.is_root() {
            fs::metadata(&entry.path)
        } else {
            fs::symlink_metadata(&entry.path)
        };
        let md = result.map_err(|source| FindError::Metadata {
            path: entry.path.clone(),
            source,
        })?;
        Ok(Self {
            size: md.size(),
            nlink: md.nlink(),
            ino: md.ino(),
        })
    }
}
