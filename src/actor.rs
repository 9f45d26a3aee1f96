//! What happens to matched paths.
//!
//! By default every match is written to stdout as it is found. Once an
//! executable is configured, matches are collected instead and handed to a
//! single child process after the walk has finished.

use std::ffi::OsString;
use std::io::{self, Stdout, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::environment::Environment;
use crate::error::FindError;
use crate::process::{self, ProcessResult};
use crate::traits::Sink;

pub struct Actor<W = Stdout> {
    /// `[executable, match_1, .., match_n]` in exec mode, empty in print mode.
    args: Vec<OsString>,
    out: W,
    /// Set after the first failed write; later matches are dropped.
    closed: bool,
}

impl Actor<Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Actor<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Actor<W> {
    /// Print-mode output goes to `out` instead of stdout.
    pub fn with_output(out: W) -> Self {
        Self {
            args: Vec::new(),
            out,
            closed: false,
        }
    }

    /// Switch to exec mode with `executable` as `argv[0]`.
    ///
    /// Call before the walk starts; switching mid-run drops anything
    /// recorded so far.
    pub fn configure_executable(&mut self, executable: impl Into<PathBuf>) {
        self.args = vec![executable.into().into_os_string()];
    }

    pub fn is_exec_mode(&self) -> bool {
        !self.args.is_empty()
    }

    /// Paths recorded for the child, in discovery order.
    pub fn pending(&self) -> &[OsString] {
        self.args.get(1..).unwrap_or_default()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Print mode: write `path` and a newline. Exec mode: queue it.
    ///
    /// Only the first write failure is returned, and not at all when the
    /// reader has gone away (`BrokenPipe`). Output stops after either.
    pub fn record(&mut self, path: &Path) -> io::Result<()> {
        if self.args.is_empty() {
            if self.closed {
                return Ok(());
            }
            let written = self
                .out
                .write_all(path.as_os_str().as_bytes())
                .and_then(|()| self.out.write_all(b"\n"));
            match written {
                Err(e) => {
                    self.closed = true;
                    if e.kind() == io::ErrorKind::BrokenPipe {
                        debug!("output closed by reader, dropping further matches");
                        Ok(())
                    } else {
                        Err(e)
                    }
                }
                ok => ok,
            }
        } else {
            self.args.push(path.as_os_str().to_os_string());
            Ok(())
        }
    }

    /// Finish the run.
    ///
    /// In exec mode with at least one recorded path, launches the executable
    /// once with every path as an argument and waits for it. Returns `None`
    /// when no process was launched.
    pub fn finalize(&mut self, env: &Environment) -> Result<Option<ProcessResult>, FindError> {
        if self.args.is_empty() {
            if self.closed {
                return Ok(None);
            }
            return match self.out.flush() {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(FindError::Output {
                    path: PathBuf::from("<stdout>"),
                    source: e,
                }),
                _ => Ok(None),
            };
        }
        if self.args.len() == 1 {
            info!("no matches, skipping '{}'", Path::new(&self.args[0]).display());
            return Ok(None);
        }

        let executable = PathBuf::from(&self.args[0]);
        let result = process::run(&executable, &self.args, env.variables())?;
        Ok(Some(result))
    }
}

impl<W: Write> Sink for Actor<W> {
    fn record(&mut self, path: &Path) -> io::Result<()> {
        Actor::record(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn print_mode_writes_lines() {
        let mut actor = Actor::with_output(Vec::new());
        actor.record(Path::new("root/a.txt")).unwrap();
        actor.record(Path::new("root/sub/c.txt")).unwrap();
        assert!(!actor.is_exec_mode());
        assert!(actor.pending().is_empty());
        assert_eq!(actor.output(), b"root/a.txt\nroot/sub/c.txt\n");
        assert_eq!(actor.finalize(&Environment::default()).unwrap(), None);
    }

    /// Accepts `room` writes, then fails every write and flush with `kind`.
    struct ClosingWriter {
        room: usize,
        kind: io::ErrorKind,
        attempts: usize,
        data: Vec<u8>,
    }

    impl ClosingWriter {
        fn new(room: usize, kind: io::ErrorKind) -> Self {
            Self { room, kind, attempts: 0, data: Vec::new() }
        }
    }

    impl Write for ClosingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            if self.attempts > self.room {
                return Err(io::Error::from(self.kind));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.attempts > self.room {
                Err(io::Error::from(self.kind))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn closed_reader_is_not_an_error() {
        // Room for one line (path + newline).
        let mut actor = Actor::with_output(ClosingWriter::new(2, io::ErrorKind::BrokenPipe));
        for p in ["a", "b", "c", "d"] {
            actor.record(Path::new(p)).unwrap();
        }
        assert_eq!(actor.output().data, b"a\n");
        // Nothing is attempted once the pipe is known to be gone.
        assert_eq!(actor.output().attempts, 3);
        assert_eq!(actor.finalize(&Environment::default()).unwrap(), None);
    }

    #[test]
    fn other_write_failures_are_reported_once() {
        let mut actor = Actor::with_output(ClosingWriter::new(0, io::ErrorKind::Other));
        let err = actor.record(Path::new("a")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        actor.record(Path::new("b")).unwrap();
        actor.record(Path::new("c")).unwrap();
        assert_eq!(actor.output().attempts, 1);
        assert_eq!(actor.finalize(&Environment::default()).unwrap(), None);
    }

    #[test]
    fn exec_mode_collects_instead_of_printing() {
        let mut actor = Actor::with_output(Vec::new());
        actor.configure_executable("/bin/true");
        actor.record(Path::new("a")).unwrap();
        actor.record(Path::new("b")).unwrap();
        assert!(actor.output().is_empty());
        assert_eq!(actor.pending(), [OsString::from("a"), OsString::from("b")]);
        assert_eq!(
            actor.finalize(&Environment::default()).unwrap(),
            Some(ProcessResult::Exited(0))
        );
    }

    #[test]
    fn exec_mode_without_matches_launches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let script = dir.path().join("touch-marker");
        fs::write(&script, format!("#!/bin/sh\n: > '{}'\n", marker.display())).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut actor = Actor::with_output(Vec::new());
        actor.configure_executable(&script);
        assert_eq!(actor.finalize(&Environment::default()).unwrap(), None);
        assert!(!marker.exists());
    }

    #[test]
    fn child_receives_every_path_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("args.log");
        let script = dir.path().join("dump-args");
        fs::write(
            &script,
            format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n", log.display()),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut actor = Actor::with_output(Vec::new());
        actor.configure_executable(&script);
        for p in ["x/one", "x/two words", "x/three"] {
            actor.record(Path::new(p)).unwrap();
        }
        let result = actor.finalize(&Environment::default()).unwrap();
        assert_eq!(result, Some(ProcessResult::Exited(0)));
        assert_eq!(fs::read_to_string(&log).unwrap(), "x/one\nx/two words\nx/three\n");
    }
}
