//! Launch one child process and decode how it ended.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Command, ExitStatus};

use tracing::{debug, warn};

use crate::error::FindError;

/// Exit status a child reports when its program image could not be loaded.
pub const LOAD_FAILURE_STATUS: i32 = 1;

/// `ENOEXEC`, same value on Linux and the BSDs.
const ENOEXEC: i32 = 8;

/// How a child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// Normal exit with this status.
    Exited(i32),
    /// Killed by this uncaught signal.
    Signaled(i32),
}

impl ProcessResult {
    /// The exit code, or the negated signal number.
    pub fn code(self) -> i32 {
        match self {
            ProcessResult::Exited(code) => code,
            ProcessResult::Signaled(signal) => -signal,
        }
    }

    pub fn success(self) -> bool {
        self == ProcessResult::Exited(0)
    }
}

impl From<ExitStatus> for ProcessResult {
    fn from(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => ProcessResult::Exited(code),
            (None, Some(signal)) => ProcessResult::Signaled(signal),
            // Only stop/continue notifications lack both, and a blocking
            // wait never returns those.
            (None, None) => ProcessResult::Exited(LOAD_FAILURE_STATUS),
        }
    }
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessResult::Exited(code) => write!(f, "exit status {code}"),
            ProcessResult::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

/// Run `executable` with `argv` (including `argv[0]`) and exactly the
/// variables in `env`, then block until it terminates.
///
/// A program that exists as a process but whose image cannot be loaded (bad
/// path, bad format, no permission) is reported as a diagnostic and counts as
/// an ordinary exit with [`LOAD_FAILURE_STATUS`].
///
/// # Errors
///
/// [`FindError::Spawn`] if the process could not be created,
/// [`FindError::Wait`] if waiting on it failed.
pub fn run(
    executable: &Path,
    argv: &[OsString],
    env: &BTreeMap<OsString, OsString>,
) -> Result<ProcessResult, FindError> {
    let mut command = Command::new(executable);
    if let Some((arg0, rest)) = argv.split_first() {
        command.arg0(arg0).args(rest);
    }
    command.env_clear().envs(env);

    debug!(program = %executable.display(), args = argv.len().saturating_sub(1), "launching");

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) if is_load_failure(&e) => {
            warn!("failed to execute '{}': {e}", executable.display());
            return Ok(ProcessResult::Exited(LOAD_FAILURE_STATUS));
        }
        Err(source) => {
            return Err(FindError::Spawn {
                program: executable.to_path_buf(),
                source,
            })
        }
    };

    let status = child.wait().map_err(|source| FindError::Wait {
        program: executable.to_path_buf(),
        source,
    })?;
    let result = ProcessResult::from(status);
    debug!(program = %executable.display(), %result, "finished");
    Ok(result)
}

fn is_load_failure(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) || e.raw_os_error() == Some(ENOEXEC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<OsString> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    #[test]
    fn exit_code_is_reported() {
        let result = run(Path::new("/bin/sh"), &sh("exit 3"), &BTreeMap::new()).unwrap();
        assert_eq!(result, ProcessResult::Exited(3));
        assert_eq!(result.code(), 3);
        assert!(!result.success());
    }

    #[test]
    fn signal_is_negated() {
        let result = run(Path::new("/bin/sh"), &sh("kill -TERM $$"), &BTreeMap::new()).unwrap();
        assert_eq!(result, ProcessResult::Signaled(15));
        assert_eq!(result.code(), -15);
    }

    #[test]
    fn environment_is_passed_verbatim() {
        let mut env = BTreeMap::new();
        env.insert(OsString::from("BFIND_MARKER"), OsString::from("42"));
        let ok = run(
            Path::new("/bin/sh"),
            &sh(r#"test "$BFIND_MARKER" = 42 && test -z "$HOME""#),
            &env,
        )
        .unwrap();
        assert!(ok.success());
    }

    #[test]
    fn unloadable_program_is_a_failed_exit() {
        let result = run(
            Path::new("/definitely/not/a/program"),
            &["prog".into()],
            &BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(result, ProcessResult::Exited(LOAD_FAILURE_STATUS));
    }
}
