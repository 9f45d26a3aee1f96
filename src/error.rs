use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FindError {
    // Config
    #[error("cannot search in '{}': {source}", .path.display())]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot search in '{}': not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("'{0}' is not a valid wildcard")]
    InvalidPattern(String),

    #[error("'{value}' is not a valid {what}")]
    InvalidNumber { value: String, what: &'static str },

    #[error("files cannot have negative sizes")]
    NegativeSize,

    #[error("cannot search files bigger than maximum size")]
    SizeOverflow,

    #[error("specified size range is invalid ({min} > {max})")]
    InvalidSizeRange { min: u64, max: u64 },

    #[error("cannot find executable '{0}' in PATH")]
    ExecutableNotFound(String),

    // Traversal
    #[error("failed to open directory '{}': {source}", .path.display())]
    OpenDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list contents for '{}': {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to close directory '{}': {source}", .path.display())]
    CloseDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to request file information for '{}': {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{}': {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Action
    #[error("failed to spawn '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for '{}': {source}", .program.display())]
    Wait {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FindError {
    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::InvalidRoot { path, .. }
            | Self::NotADirectory(path)
            | Self::OpenDir { path, .. }
            | Self::ReadDir { path, .. }
            | Self::CloseDir { path, .. }
            | Self::Metadata { path, .. }
            | Self::Output { path, .. } => Some(path),
            Self::Spawn { program, .. } | Self::Wait { program, .. } => Some(program),
            _ => None,
        }
    }

    /// Whether the walk can continue after this error.
    ///
    /// Per-directory and per-entry failures are absorbed: they are reported
    /// and the walk moves on. Configuration and action-launch failures end
    /// the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OpenDir { .. }
                | Self::ReadDir { .. }
                | Self::CloseDir { .. }
                | Self::Metadata { .. }
                | Self::Output { .. }
        )
    }
}
