use std::io;
use std::path::Path;

use tracing::warn;

use crate::entry::Entry;
use crate::error::FindError;

/// Determines whether an entry is a match.
///
/// [`Query`](crate::Query) is the built-in implementation. Implement this to
/// drive the walker with other matching logic.
///
/// # Example
///
/// ```rust
/// use bfind::{Entry, EntryKind, FindError, Matcher};
///
/// struct DirsOnly;
///
/// impl Matcher for DirsOnly {
///     fn is_match(&self, entry: &Entry) -> Result<bool, FindError> {
///         Ok(entry.kind == EntryKind::Dir)
///     }
/// }
/// ```
pub trait Matcher {
    /// Returns `Ok(true)` if this entry should be handed to the sink.
    ///
    /// An `Err` is reported by the walker and the entry is skipped; it never
    /// aborts the walk.
    fn is_match(&self, entry: &Entry) -> Result<bool, FindError>;
}

/// Receives matched paths in discovery order.
pub trait Sink {
    fn record(&mut self, path: &Path) -> io::Result<()>;
}

/// Side channel for non-fatal errors met during a walk.
pub trait Reporter {
    fn report(&mut self, error: FindError);
}

impl Sink for Vec<std::path::PathBuf> {
    fn record(&mut self, path: &Path) -> io::Result<()> {
        self.push(path.to_path_buf());
        Ok(())
    }
}

impl Reporter for Vec<FindError> {
    fn report(&mut self, error: FindError) {
        self.push(error);
    }
}

/// Logs every error as a `warn!` event, optionally keeping it as well.
#[derive(Debug, Default)]
pub struct LogReporter {
    collect: bool,
    errors: Vec<FindError>,
}

impl LogReporter {
    pub fn new(collect: bool) -> Self {
        Self {
            collect,
            errors: Vec::new(),
        }
    }

    pub fn into_errors(self) -> Vec<FindError> {
        self.errors
    }
}

impl Reporter for LogReporter {
    fn report(&mut self, error: FindError) {
        warn!("{error}");
        if self.collect {
            self.errors.push(error);
        }
    }
}
