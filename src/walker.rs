//! Breadth-first directory walker.
//!
//! Directories are drained in FIFO order of discovery from an explicit queue
//! seeded with the root. Within a directory, entries come in whatever order
//! the listing yields them. Every directory is descended into regardless of
//! whether it matches; symlinks are reported as [`EntryKind::Other`] and
//! never followed.

use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use nix::dir::{Dir, Entry as DirEntry, Type};
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::unistd;
use tracing::debug;

use crate::entry::{Entry, EntryKind};
use crate::error::FindError;
use crate::traits::{Matcher, Reporter, Sink};

pub const PATH_SEPARATOR: u8 = b'/';

/// Entries pulled from a directory listing per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Counters for one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Directories successfully opened.
    pub dirs: usize,
    /// Candidates evaluated, root included.
    pub entries: usize,
    /// Candidates handed to the sink.
    pub matches: usize,
}

#[derive(Debug, Clone)]
pub struct Walker {
    batch_size: usize,
}

impl Default for Walker {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// A queued directory: separator-terminated path plus its depth.
struct PendingDir {
    path: OsString,
    depth: usize,
}

/// An open directory.
///
/// The listing stream reads through a duplicate of `fd`; `fd` itself is
/// closed by [`DirHandle::close`] so that a failed `close(2)` is seen
/// rather than swallowed on drop.
struct DirHandle {
    fd: RawFd,
    listing: Dir,
}

impl DirHandle {
    fn open(path: &Path) -> io::Result<Self> {
        let fd = fcntl::open(
            path,
            OFlag::O_RDONLY | OFlag::O_DIRECTORY | OFlag::O_CLOEXEC,
            Mode::empty(),
        )?;
        match unistd::dup(fd).and_then(Dir::from_fd) {
            Ok(listing) => Ok(Self { fd, listing }),
            Err(e) => {
                let _ = unistd::close(fd);
                Err(e.into())
            }
        }
    }

    fn close(self) -> io::Result<()> {
        drop(self.listing);
        unistd::close(self.fd).map_err(io::Error::from)
    }
}

impl Walker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap on entries pulled from the listing at a time. Clamped to at least 1.
    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    /// Walk the tree under `root`, sending every match to `sink`.
    ///
    /// The root itself is evaluated first, so a matching root is reported
    /// even though it never shows up as anyone's child. Unreadable
    /// directories and failed metadata lookups go to `reporter` and the walk
    /// carries on.
    pub fn walk<M, S, R>(&self, root: &Path, matcher: &M, sink: &mut S, reporter: &mut R) -> WalkStats
    where
        M: Matcher + ?Sized,
        S: Sink + ?Sized,
        R: Reporter + ?Sized,
    {
        let mut stats = WalkStats::default();
        let root = with_trailing_separator(root.as_os_str());

        let root_entry = Entry {
            path: PathBuf::from(&root),
            name: root_name(&root),
            kind: EntryKind::Dir,
            depth: 0,
            ino: None,
        };
        visit(&root_entry, matcher, sink, reporter, &mut stats);

        let mut queue = VecDeque::new();
        queue.push_back(PendingDir {
            path: root,
            depth: 0,
        });

        // Scratch buffer scoped to this walk.
        let mut batch: Vec<DirEntry> = Vec::with_capacity(self.batch_size);

        while let Some(dir) = queue.pop_front() {
            let mut handle = match DirHandle::open(Path::new(&dir.path)) {
                Ok(handle) => handle,
                Err(source) => {
                    reporter.report(FindError::OpenDir {
                        path: dir.path.into(),
                        source,
                    });
                    continue;
                }
            };
            stats.dirs += 1;
            debug!(dir = %Path::new(&dir.path).display(), depth = dir.depth, "scanning");

            self.drain(&dir, &mut handle.listing, &mut batch, &mut queue, matcher, sink, reporter, &mut stats);

            if let Err(source) = handle.close() {
                reporter.report(FindError::CloseDir {
                    path: dir.path.into(),
                    source,
                });
            }
        }

        stats
    }

    #[allow(clippy::too_many_arguments)]
    fn drain<M, S, R>(
        &self,
        dir: &PendingDir,
        listing: &mut Dir,
        batch: &mut Vec<DirEntry>,
        queue: &mut VecDeque<PendingDir>,
        matcher: &M,
        sink: &mut S,
        reporter: &mut R,
        stats: &mut WalkStats,
    ) where
        M: Matcher + ?Sized,
        S: Sink + ?Sized,
        R: Reporter + ?Sized,
    {
        let mut listing = listing.iter();
        loop {
            let more = fill_batch(&mut listing, batch, self.batch_size);

            for dirent in batch.drain(..) {
                let name = OsStr::from_bytes(dirent.file_name().to_bytes());
                if name == "." || name == ".." {
                    continue;
                }

                let mut path = dir.path.clone();
                path.push(name);

                let kind = match dirent.file_type() {
                    Some(Type::Directory) => EntryKind::Dir,
                    Some(Type::File) => EntryKind::File,
                    Some(_) => EntryKind::Other,
                    // No type in the listing; ask without following links.
                    None => fs::symlink_metadata(&path)
                        .map(|md| EntryKind::from_file_type(md.file_type()))
                        .unwrap_or(EntryKind::Unknown),
                };

                // Descent is independent of matching.
                if kind == EntryKind::Dir {
                    queue.push_back(PendingDir {
                        path: with_trailing_separator(&path),
                        depth: dir.depth + 1,
                    });
                }

                let entry = Entry {
                    path: PathBuf::from(path),
                    name: name.to_os_string(),
                    kind,
                    depth: dir.depth + 1,
                    ino: Some(dirent.ino()),
                };
                visit(&entry, matcher, sink, reporter, stats);
            }

            match more {
                Ok(true) => {}
                Ok(false) => break,
                Err(source) => {
                    reporter.report(FindError::ReadDir {
                        path: dir.path.clone().into(),
                        source,
                    });
                    break;
                }
            }
        }
    }
}

/// Pull up to `size` entries into `batch`. `Ok(true)` means the listing may
/// have more; `Ok(false)` means it is exhausted.
fn fill_batch<T, I>(listing: &mut I, batch: &mut Vec<T>, size: usize) -> io::Result<bool>
where
    I: Iterator<Item = nix::Result<T>>,
{
    while batch.len() < size {
        match listing.next() {
            Some(Ok(dirent)) => batch.push(dirent),
            Some(Err(e)) => return Err(e.into()),
            None => return Ok(false),
        }
    }
    Ok(true)
}

fn visit<M, S, R>(entry: &Entry, matcher: &M, sink: &mut S, reporter: &mut R, stats: &mut WalkStats)
where
    M: Matcher + ?Sized,
    S: Sink + ?Sized,
    R: Reporter + ?Sized,
{
    stats.entries += 1;
    match matcher.is_match(entry) {
        Ok(true) => {
            stats.matches += 1;
            if let Err(source) = sink.record(&entry.path) {
                reporter.report(FindError::Output {
                    path: entry.path.clone(),
                    source,
                });
            }
        }
        Ok(false) => {}
        Err(e) => reporter.report(e),
    }
}

fn with_trailing_separator(path: &OsStr) -> OsString {
    let mut owned = if path.is_empty() {
        OsString::from(".")
    } else {
        path.to_os_string()
    };
    if owned.as_bytes().last() != Some(&PATH_SEPARATOR) {
        owned.push("/");
    }
    owned
}

/// Last path component, ignoring trailing separators; `/` for the
/// filesystem root.
fn root_name(path: &OsStr) -> OsString {
    let bytes = path.as_bytes();
    let end = bytes
        .iter()
        .rposition(|&b| b != PATH_SEPARATOR)
        .map_or(0, |i| i + 1);
    if end == 0 {
        return OsString::from("/");
    }
    let start = bytes[..end]
        .iter()
        .rposition(|&b| b == PATH_SEPARATOR)
        .map_or(0, |i| i + 1);
    OsStr::from_bytes(&bytes[start..end]).to_os_string()
}
