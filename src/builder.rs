use std::fs;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::debug;

use crate::actor::Actor;
use crate::environment::Environment;
use crate::error::FindError;
use crate::query::Query;
use crate::results::{Results, ScanStats};
use crate::traits::{LogReporter, Sink};
use crate::walker::{Walker, DEFAULT_BATCH_SIZE};

// ---------------------------------------------------------------------------
// SearchBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and executing a run.
///
/// Created via [`bfind::search()`](crate::search). Configure with chained
/// builder methods, then call [`run()`](SearchBuilder::run) to execute.
///
/// # Example
///
/// ```rust,ignore
/// let mut query = bfind::Query::new();
/// query.set_wildcard("*.rs");
///
/// let results = bfind::search("src")
///     .query(query)
///     .exec("/usr/bin/wc")
///     .collect_errors(true)
///     .run(&bfind::Environment::from_env())?;
/// ```
pub struct SearchBuilder<W = Stdout> {
    root:           PathBuf,
    query:          Query,
    executable:     Option<PathBuf>,
    batch_size:     usize,
    collect_paths:  bool,
    collect_errors: bool,
    out:            W,
}

impl SearchBuilder<Stdout> {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root:           root.into(),
            query:          Query::default(),
            executable:     None,
            batch_size:     DEFAULT_BATCH_SIZE,
            collect_paths:  false,
            collect_errors: false,
            out:            io::stdout(),
        }
    }
}

impl<W: Write> SearchBuilder<W> {
    // ── Query ─────────────────────────────────────────────────────────────

    /// Set the filter criteria. The default query matches everything.
    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    // ── Action ────────────────────────────────────────────────────────────

    /// Pass all matches to `executable` once the walk completes, instead of
    /// printing them. The path is used as given; resolve bare names with
    /// [`Environment::find_executable`] first.
    pub fn exec(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// Print-mode output goes to `out` instead of stdout.
    pub fn output<O: Write>(self, out: O) -> SearchBuilder<O> {
        SearchBuilder {
            root:           self.root,
            query:          self.query,
            executable:     self.executable,
            batch_size:     self.batch_size,
            collect_paths:  self.collect_paths,
            collect_errors: self.collect_errors,
            out,
        }
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// How many directory entries to pull from the listing at a time.
    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    /// Collect matched paths into [`Results::paths`].
    pub fn collect_paths(mut self, yes: bool) -> Self {
        self.collect_paths = yes;
        self
    }

    /// Collect non-fatal errors into [`Results::errors`]. They are logged
    /// either way.
    pub fn collect_errors(mut self, yes: bool) -> Self {
        self.collect_errors = yes;
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Validate the configuration, walk the tree, then run the final action.
    ///
    /// # Errors
    ///
    /// Configuration errors (root missing or not a directory, empty size
    /// range) are returned before anything is traversed. Failing to spawn or
    /// wait on the exec-mode child is returned after the walk. Everything
    /// else is non-fatal and only logged (and collected, if asked).
    pub fn run(self, env: &Environment) -> Result<Results, FindError> {
        validate_root(&self.root)?;
        if !self.query.validate_size_range() {
            let (min, max) = self.query.size_bounds();
            return Err(FindError::InvalidSizeRange { min, max });
        }

        let mut actor = Actor::with_output(self.out);
        if let Some(executable) = self.executable {
            actor.configure_executable(executable);
        }

        let mut sink = Collecting {
            inner: &mut actor,
            paths: self.collect_paths.then(Vec::new),
        };
        let mut reporter = LogReporter::new(self.collect_errors);

        let start = Instant::now();
        let walk = Walker::new()
            .batch_size(self.batch_size)
            .walk(&self.root, &self.query, &mut sink, &mut reporter);
        let duration = start.elapsed();
        debug!(?walk, ?duration, "walk complete");

        let paths = sink.paths.unwrap_or_default();
        let action = actor.finalize(env)?;

        Ok(Results {
            matches: walk.matches,
            paths,
            stats: ScanStats::compute(walk, duration),
            errors: reporter.into_errors(),
            action,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The root must exist and be a directory (symlinks to one are fine).
fn validate_root(root: &Path) -> Result<(), FindError> {
    let md = fs::metadata(root).map_err(|source| FindError::InvalidRoot {
        path: root.to_path_buf(),
        source,
    })?;
    if !md.is_dir() {
        return Err(FindError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Forwards to the actor, keeping a copy of each path when asked.
struct Collecting<'a, S: ?Sized> {
    inner: &'a mut S,
    paths: Option<Vec<PathBuf>>,
}

impl<S: Sink + ?Sized> Sink for Collecting<'_, S> {
    fn record(&mut self, path: &Path) -> io::Result<()> {
        if let Some(paths) = self.paths.as_mut() {
            paths.push(path.to_path_buf());
        }
        self.inner.record(path)
    }
}
