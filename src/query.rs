//! Filter criteria and their evaluation.
//!
//! A [`Query`] holds a set of active [`Criterion`] kinds plus the values
//! each one compares against. Evaluation walks the criteria in cost order:
//! the name test needs nothing but the listed file name, the inode test can
//! usually use the listing's own inode, and only size and hard-link tests
//! force a `stat()`. That `stat()` happens at most once per candidate.

use glob::Pattern;

use crate::entry::{Entry, ExtendedMetadata};
use crate::error::FindError;
use crate::traits::Matcher;

// ---------------------------------------------------------------------------
// Criterion / CriteriaSet
// ---------------------------------------------------------------------------

/// One independently toggleable filter test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Name,
    Inode,
    Size,
    Hardlinks,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::Name,
        Criterion::Inode,
        Criterion::Size,
        Criterion::Hardlinks,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A small fixed-size set of active criteria.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CriteriaSet(u8);

impl CriteriaSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, criterion: Criterion) {
        self.0 |= criterion.bit();
    }

    pub fn contains(&self, criterion: Criterion) -> bool {
        self.0 & criterion.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Criterion> + '_ {
        Criterion::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

// ---------------------------------------------------------------------------
// Evaluation order
// ---------------------------------------------------------------------------

type Check = fn(&Query, &Entry, &mut LazyMetadata) -> Result<bool, FindError>;

/// Cheapest first. Evaluation stops at the first failing check.
const CHECKS: [(Criterion, Check); 4] = [
    (Criterion::Name, Query::check_name as Check),
    (Criterion::Inode, Query::check_inode as Check),
    (Criterion::Size, Query::check_size as Check),
    (Criterion::Hardlinks, Query::check_hardlinks as Check),
];

/// Extended metadata for one candidate, fetched on first use.
#[derive(Debug, Default)]
pub(crate) struct LazyMetadata {
    cached: Option<ExtendedMetadata>,
}

impl LazyMetadata {
    fn get(&mut self, entry: &Entry) -> Result<ExtendedMetadata, FindError> {
        if let Some(md) = self.cached {
            return Ok(md);
        }
        let md = ExtendedMetadata::fetch(entry)?;
        self.cached = Some(md);
        Ok(md)
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// The filter specification for one run.
///
/// A default query has no active criteria and matches every entry.
/// Size bounds are inclusive and compose conjunctively: each new lower bound
/// is max'ed with the current one, each new upper bound min'ed.
#[derive(Debug, Clone)]
pub struct Query {
    criteria: CriteriaSet,
    wildcard: Option<Pattern>,
    inode: u64,
    hardlinks: u64,
    min_size: u64,
    max_size: u64,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            criteria: CriteriaSet::empty(),
            wildcard: None,
            inode: 0,
            hardlinks: 0,
            min_size: 0,
            max_size: u64::MAX,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `pattern` is a syntactically legal shell wildcard.
    pub fn validate_wildcard(pattern: &str) -> bool {
        compile_wildcard(pattern).is_ok()
    }

    /// Activate the name criterion. Returns `false` and leaves the query
    /// untouched if `pattern` is malformed (e.g. an unterminated `[`).
    pub fn set_wildcard(&mut self, pattern: &str) -> bool {
        match compile_wildcard(pattern) {
            Ok(compiled) => {
                self.wildcard = Some(compiled);
                self.criteria.insert(Criterion::Name);
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_inode(&mut self, inode: u64) {
        self.inode = inode;
        self.criteria.insert(Criterion::Inode);
    }

    pub fn set_hardlinks(&mut self, hardlinks: u64) {
        self.hardlinks = hardlinks;
        self.criteria.insert(Criterion::Hardlinks);
    }

    pub fn set_min_size(&mut self, min_size: u64) {
        self.min_size = self.min_size.max(min_size);
        self.criteria.insert(Criterion::Size);
    }

    pub fn set_max_size(&mut self, max_size: u64) {
        self.max_size = self.max_size.min(max_size);
        self.criteria.insert(Criterion::Size);
    }

    /// Collapse both bounds to `size`, discarding any earlier bounds.
    pub fn set_exact_size(&mut self, size: u64) {
        self.min_size = size;
        self.max_size = size;
        self.criteria.insert(Criterion::Size);
    }

    /// Must hold before the query is used for a walk.
    pub fn validate_size_range(&self) -> bool {
        self.min_size <= self.max_size
    }

    pub fn criteria(&self) -> CriteriaSet {
        self.criteria
    }

    /// Inclusive `(min, max)` size bounds.
    pub fn size_bounds(&self) -> (u64, u64) {
        (self.min_size, self.max_size)
    }

    /// Evaluate `entry` against every active criterion.
    ///
    /// # Errors
    ///
    /// Returns [`FindError::Metadata`] when a criterion needs a `stat()` and
    /// it fails, typically because the entry vanished after being listed.
    pub fn matches(&self, entry: &Entry) -> Result<bool, FindError> {
        self.matches_with(entry, &mut LazyMetadata::default())
    }

    pub(crate) fn matches_with(
        &self,
        entry: &Entry,
        metadata: &mut LazyMetadata,
    ) -> Result<bool, FindError> {
        for (criterion, check) in CHECKS {
            if self.criteria.contains(criterion) && !check(self, entry, metadata)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn check_name(&self, entry: &Entry, _: &mut LazyMetadata) -> Result<bool, FindError> {
        Ok(self
            .wildcard
            .as_ref()
            .map(|p| p.matches(&entry.name.to_string_lossy()))
            .unwrap_or(true))
    }

    fn check_inode(&self, entry: &Entry, metadata: &mut LazyMetadata) -> Result<bool, FindError> {
        let ino = match entry.ino {
            Some(ino) => ino,
            None => metadata.get(entry)?.ino,
        };
        Ok(ino == self.inode)
    }

    fn check_size(&self, entry: &Entry, metadata: &mut LazyMetadata) -> Result<bool, FindError> {
        let size = metadata.get(entry)?.size;
        Ok(self.min_size <= size && size <= self.max_size)
    }

    fn check_hardlinks(
        &self,
        entry: &Entry,
        metadata: &mut LazyMetadata,
    ) -> Result<bool, FindError> {
        Ok(metadata.get(entry)?.nlink == self.hardlinks)
    }
}

impl Matcher for Query {
    fn is_match(&self, entry: &Entry) -> Result<bool, FindError> {
        self.matches(entry)
    }
}

/// Translate a shell wildcard into `glob` syntax and compile it.
///
/// Shell wildcards differ from `glob` in three places: `\x` matches `x`
/// literally, `[^...]` negates like `[!...]`, and `**` is just `*` within a
/// single name (`glob` rejects it outside a whole path component). An
/// unterminated `[` is passed through so `glob` rejects it.
fn compile_wildcard(pattern: &str) -> Result<Pattern, glob::PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 2);
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                push_literal(&mut out, chars[i + 1]);
                i += 2;
            }
            '*' => {
                if !out.ends_with('*') {
                    out.push('*');
                }
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push('[');
                    let mut j = i + 1;
                    if matches!(chars[j], '!' | '^') {
                        out.push('!');
                        j += 1;
                    }
                    while j < end {
                        if chars[j] == '\\' && j + 1 < end {
                            j += 1;
                        }
                        out.push(chars[j]);
                        j += 1;
                    }
                    out.push(']');
                    i = end + 1;
                }
                None => {
                    out.extend(&chars[i..]);
                    break;
                }
            },
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Pattern::new(&out)
}

/// Index of the `]` closing the class opened at `start`. A `]` right after
/// the opening (or after its negation) is a member, not the close.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if matches!(chars.get(j), Some('!' | '^')) {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            ']' => return Some(j),
            _ => j += 1,
        }
    }
    None
}

fn push_literal(out: &mut String, c: char) {
    if matches!(c, '*' | '?' | '[' | ']') {
        out.push('[');
        out.push(c);
        out.push(']');
    } else {
        out.push(c);
    }
}
