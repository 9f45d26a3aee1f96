//! # bfind
//!
//! Breadth-first file finder: filter by name, inode, size and hard-link
//! count, then print the matches or hand them all to one program.
//!
//! bfind owns three pieces: the [`Query`] that decides what matches, the
//! [`Walker`] that enumerates the tree while avoiding `stat()` calls it does
//! not need, and the [`Actor`] that prints matches or launches a single
//! child process once the walk is done.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bfind::{Environment, Query};
//!
//! let mut query = Query::new();
//! assert!(query.set_wildcard("*.txt"));
//! query.set_max_size(99);
//!
//! let results = bfind::search("/var/log")
//!     .query(query)
//!     .collect_paths(true)
//!     .run(&Environment::from_env())
//!     .unwrap();
//!
//! println!("{} small text files in {} directories",
//!     results.matches,
//!     results.stats.dirs,
//! );
//! ```
//!
//! # Custom Matchers
//!
//! The walker accepts anything implementing [`Matcher`]:
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use bfind::{Entry, EntryKind, FindError, Matcher, Walker};
//!
//! struct Dirs;
//!
//! impl Matcher for Dirs {
//!     fn is_match(&self, entry: &Entry) -> Result<bool, FindError> {
//!         Ok(entry.kind == EntryKind::Dir)
//!     }
//! }
//!
//! let mut found: Vec<PathBuf> = Vec::new();
//! let mut errors: Vec<FindError> = Vec::new();
//! Walker::new().walk("/etc".as_ref(), &Dirs, &mut found, &mut errors);
//! ```

#![forbid(unsafe_code)]

pub mod cli;
pub mod process;
pub mod walker;

mod actor;
mod builder;
mod entry;
mod environment;
mod error;
mod query;
mod results;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use actor::Actor;
pub use builder::SearchBuilder;
pub use entry::{Entry, EntryKind, ExtendedMetadata};
pub use environment::Environment;
pub use error::FindError;
pub use process::ProcessResult;
pub use query::{CriteriaSet, Criterion, Query};
pub use results::{Results, ScanStats};
pub use traits::{LogReporter, Matcher, Reporter, Sink};
pub use walker::{WalkStats, Walker};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`SearchBuilder`] rooted at `root`.
///
/// # Example
///
/// ```rust
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("invoice.txt"), "jan").unwrap();
/// std::fs::write(dir.path().join("report.md"), "q1").unwrap();
///
/// let mut query = bfind::Query::new();
/// query.set_wildcard("*.txt");
///
/// let results = bfind::search(dir.path())
///     .query(query)
///     .output(Vec::new())
///     .run(&bfind::Environment::default())
///     .unwrap();
///
/// assert_eq!(results.matches, 1);
/// ```
pub fn search(root: impl Into<std::path::PathBuf>) -> SearchBuilder {
    SearchBuilder::new(root)
}
