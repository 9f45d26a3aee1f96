use std::path::PathBuf;
use std::time::Duration;

use crate::error::FindError;
use crate::process::ProcessResult;
use crate::walker::WalkStats;

/// The output of a completed run.
///
/// `paths` and `errors` are both opt-in — disabled by default to avoid
/// allocation overhead in the common case. Enable them on the builder:
/// `.collect_paths(true)` and `.collect_errors(true)`.
#[derive(Debug)]
pub struct Results {
    /// Total number of entries that matched the query.
    pub matches: usize,

    /// Paths of matched entries, in the order they were found.
    /// Only populated if `.collect_paths(true)` was set on the builder.
    pub paths: Vec<PathBuf>,

    /// Scan statistics.
    pub stats: ScanStats,

    /// Non-fatal errors encountered during the walk (unreadable directories,
    /// vanished entries). Only populated if `.collect_errors(true)` was set.
    pub errors: Vec<FindError>,

    /// How the exec-mode child ended. `None` in print mode, or when there
    /// was nothing to pass it.
    pub action: Option<ProcessResult>,
}

/// Statistics for a completed scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanStats {
    /// Directories opened and listed.
    pub dirs: usize,

    /// Candidates evaluated against the query, root included.
    pub entries: usize,

    /// Wall-clock time of the walk, excluding the final action.
    pub duration: Duration,

    /// Entries evaluated per second, clamped to 0 on zero-duration runs.
    pub entries_per_sec: usize,
}

impl ScanStats {
    pub(crate) fn compute(walk: WalkStats, duration: Duration) -> Self {
        let eps = if duration.as_secs_f64() > 0.0 {
            (walk.entries as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
        Self {
            dirs: walk.dirs,
            entries: walk.entries,
            duration,
            entries_per_sec: eps,
        }
    }
}
