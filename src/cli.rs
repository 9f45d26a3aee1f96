//! find-style command line.
//!
//! `bfind <path> [-name P] [-inum N] [-size [-=+]N] [-nlinks N] [-exec PROG]`
//!
//! clap only understands `--long` flags, so the single-dash spellings are
//! rewritten before parsing. Values are passed through untouched, which is
//! what lets `-size -100` mean "smaller than 100 bytes".

use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use clap::Parser;

use crate::environment::Environment;
use crate::error::FindError;
use crate::query::Query;

/// Flags spelled with one dash, and whether each takes a value.
static FIND_FLAGS: [(&str, bool); 7] = [
    ("-name", true),
    ("-inum", true),
    ("-size", true),
    ("-nlinks", true),
    ("-exec", true),
    ("-verbose", false),
    ("-help", false),
];

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bfind",
    about = "bfind - locate specified files recursively in the provided path",
    args_override_self = true
)]
pub struct CliArgs {
    /// Directory to search in
    pub path: PathBuf,

    /// File name matches this wildcard
    #[arg(long, value_name = "PATTERN", allow_hyphen_values = true)]
    pub name: Option<String>,

    /// Inode number equals NUM
    #[arg(long, value_name = "NUM", value_parser = parse_count("inode number"))]
    pub inum: Option<u64>,

    /// Filter by size: -N less than, =N or N exactly, +N more than (repeatable)
    #[arg(long, value_name = "[-=+]SIZE", allow_hyphen_values = true)]
    pub size: Vec<String>,

    /// Hard-link count equals NUM
    #[arg(long, value_name = "NUM", value_parser = parse_count("hardlinks count"))]
    pub nlinks: Option<u64>,

    /// Pass located files to PROGRAM once the search completes
    #[arg(long, value_name = "PROGRAM")]
    pub exec: Option<String>,

    /// Log every directory visited
    #[arg(long)]
    pub verbose: bool,
}

/// Everything a run needs, validated.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub root: PathBuf,
    pub query: Query,
    pub executable: Option<PathBuf>,
    pub verbose: bool,
}

impl CliArgs {
    /// Parse find-style arguments (`argv[0]` included).
    pub fn parse_find_style<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        CliArgs::try_parse_from(normalize_args(args))
    }

    /// Build the query and resolve the executable.
    ///
    /// The root is given a trailing `/`; whether it is a directory is
    /// checked when the search runs.
    pub fn into_invocation(self, env: &Environment) -> Result<Invocation, FindError> {
        let mut query = Query::new();

        if let Some(pattern) = &self.name {
            if !query.set_wildcard(pattern) {
                return Err(FindError::InvalidPattern(pattern.clone()));
            }
        }
        if let Some(inode) = self.inum {
            query.set_inode(inode);
        }
        for spec in &self.size {
            apply_size(&mut query, spec)?;
        }
        if let Some(links) = self.nlinks {
            query.set_hardlinks(links);
        }
        if !query.validate_size_range() {
            let (min, max) = query.size_bounds();
            return Err(FindError::InvalidSizeRange { min, max });
        }

        let executable = match &self.exec {
            Some(name) => Some(
                env.find_executable(name)
                    .ok_or_else(|| FindError::ExecutableNotFound(name.clone()))?,
            ),
            None => None,
        };

        let mut root = self.path.into_os_string();
        if root.as_bytes().last() != Some(&b'/') {
            root.push("/");
        }

        Ok(Invocation {
            root: root.into(),
            query,
            executable,
            verbose: self.verbose,
        })
    }
}

/// Rewrite `-flag` to `--flag` wherever a flag is expected.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut expect_value = false;
    for (i, arg) in args.into_iter().map(Into::into).enumerate() {
        if i == 0 || expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }
        let known = arg
            .to_str()
            .and_then(|s| FIND_FLAGS.iter().find(|(flag, _)| *flag == s));
        match known {
            Some((flag, takes_value)) => {
                expect_value = *takes_value;
                out.push(OsString::from(format!("-{flag}")));
            }
            None => out.push(arg),
        }
    }
    out
}

/// Apply one `-size` value: `-N` → at most N-1, `+N` → at least N+1,
/// `=N` or `N` → exactly N.
pub fn apply_size(query: &mut Query, spec: &str) -> Result<(), FindError> {
    let (range, digits) = match spec.chars().next() {
        Some(c @ ('-' | '+' | '=')) => (c, &spec[1..]),
        _ => ('=', spec),
    };
    let size = parse_u64(digits, "size")?;
    match range {
        '-' => {
            if size == 0 {
                return Err(FindError::NegativeSize);
            }
            query.set_max_size(size - 1);
        }
        '+' => {
            if size == u64::MAX {
                return Err(FindError::SizeOverflow);
            }
            query.set_min_size(size + 1);
        }
        _ => query.set_exact_size(size),
    }
    Ok(())
}

fn parse_u64(value: &str, what: &'static str) -> Result<u64, FindError> {
    value.parse().map_err(|_| FindError::InvalidNumber {
        value: value.to_string(),
        what,
    })
}

fn parse_count(what: &'static str) -> impl Fn(&str) -> Result<u64, FindError> + Clone {
    move |value| parse_u64(value, what)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::parse_find_style(args.iter().copied())
    }

    #[test]
    fn single_dash_flags_are_normalized() {
        let out = normalize_args(["bfind", "dir", "-name", "-size", "-size", "-100", "-verbose"]);
        assert_eq!(
            out,
            ["bfind", "dir", "--name", "-size", "--size", "-100", "--verbose"]
        );
    }

    #[test]
    fn parses_every_flag() {
        let args = parse(&[
            "bfind", "/tmp", "-name", "*.txt", "-inum", "12", "-size", "-100", "-size", "+3",
            "-nlinks", "1", "-exec", "/bin/echo",
        ])
        .unwrap();
        assert_eq!(args.name.as_deref(), Some("*.txt"));
        assert_eq!(args.inum, Some(12));
        assert_eq!(args.size, ["-100", "+3"]);
        assert_eq!(args.nlinks, Some(1));

        let inv = args.into_invocation(&Environment::default()).unwrap();
        assert_eq!(inv.root, PathBuf::from("/tmp/"));
        assert_eq!(inv.query.size_bounds(), (4, 99));
        assert_eq!(inv.executable, Some(PathBuf::from("/bin/echo")));
    }

    #[test]
    fn only_find_flags_are_rewritten() {
        let out = normalize_args(["bfind", "dir", "-help", "-version"]);
        assert_eq!(out, ["bfind", "dir", "--help", "-version"]);

        let err = parse(&["bfind", ".", "-version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
        let err = parse(&["bfind", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
        let err = parse(&["bfind", "-help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn repeated_scalar_flags_last_wins() {
        let args = parse(&["bfind", ".", "-inum", "1", "-inum", "2"]).unwrap();
        assert_eq!(args.inum, Some(2));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(parse(&["bfind", ".", "-inum", "abc"]).is_err());
        // Same treatment as -inum, not silently ignored.
        assert!(parse(&["bfind", ".", "-nlinks", "two"]).is_err());
        assert!(parse(&["bfind", ".", "-inum"]).is_err());
    }

    #[test]
    fn size_edge_cases() {
        let mut q = Query::new();
        assert!(matches!(apply_size(&mut q, "-0"), Err(FindError::NegativeSize)));
        assert!(matches!(
            apply_size(&mut q, &format!("+{}", u64::MAX)),
            Err(FindError::SizeOverflow)
        ));
        assert!(matches!(
            apply_size(&mut q, "=ten"),
            Err(FindError::InvalidNumber { what: "size", .. })
        ));

        apply_size(&mut q, "1000").unwrap();
        assert_eq!(q.size_bounds(), (1000, 1000));
    }

    #[test]
    fn size_order_matters_across_exact() {
        let inv = parse(&["bfind", ".", "-size", "-10", "-size", "=50"])
            .unwrap()
            .into_invocation(&Environment::default())
            .unwrap();
        assert_eq!(inv.query.size_bounds(), (50, 50));

        let err = parse(&["bfind", ".", "-size", "=50", "-size", "-10"])
            .unwrap()
            .into_invocation(&Environment::default())
            .unwrap_err();
        assert!(matches!(err, FindError::InvalidSizeRange { min: 50, max: 9 }));
    }

    #[test]
    fn invalid_wildcard_and_missing_program() {
        let err = parse(&["bfind", ".", "-name", "[abc"])
            .unwrap()
            .into_invocation(&Environment::default())
            .unwrap_err();
        assert!(matches!(err, FindError::InvalidPattern(p) if p == "[abc"));

        let err = parse(&["bfind", ".", "-exec", "no-such-program-xyz"])
            .unwrap()
            .into_invocation(&Environment::default())
            .unwrap_err();
        assert!(matches!(err, FindError::ExecutableNotFound(_)));
    }
}
