use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Snapshot of environment variables, handed verbatim to the child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<OsString, OsString>,
}

impl Environment {
    pub fn new(vars: BTreeMap<OsString, OsString>) -> Self {
        Self { vars }
    }

    /// Capture the current process environment.
    pub fn from_env() -> Self {
        Self {
            vars: env::vars_os().collect(),
        }
    }

    pub fn get(&self, name: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(name.as_ref()).map(OsString::as_os_str)
    }

    pub fn variables(&self) -> &BTreeMap<OsString, OsString> {
        &self.vars
    }

    /// Resolve `name` to an executable file.
    ///
    /// Names containing a `/` are taken as paths. Anything else is looked up
    /// in each `PATH` directory in order; the first regular file with an
    /// execute bit wins.
    pub fn find_executable(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        if name.contains('/') {
            let path = PathBuf::from(name);
            return is_executable(&path).then_some(path);
        }
        let search = self.get("PATH")?;
        env::split_paths(search)
            .filter(|dir| !dir.as_os_str().as_bytes().is_empty())
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|md| md.is_file() && md.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn with_path(path: &Path) -> Environment {
        let mut vars = BTreeMap::new();
        vars.insert(OsString::from("PATH"), path.as_os_str().to_os_string());
        Environment::new(vars)
    }

    #[test]
    fn finds_executable_in_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        let plain = dir.path().join("plain");
        fs::write(&plain, "data").unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();

        let env = with_path(dir.path());
        assert_eq!(env.find_executable("tool"), Some(tool));
        assert_eq!(env.find_executable("plain"), None);
        assert_eq!(env.find_executable("missing"), None);
    }

    #[test]
    fn slash_names_bypass_path() {
        let env = Environment::default();
        assert_eq!(env.find_executable("/bin/sh"), Some(PathBuf::from("/bin/sh")));
        assert_eq!(env.find_executable("sh"), None, "no PATH, no lookup");
    }

    #[test]
    fn snapshot_sees_process_env() {
        let env = Environment::from_env();
        assert_eq!(env.variables().len(), std::env::vars_os().count());
    }
}
