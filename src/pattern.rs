// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::sync::Arc;

/// Path separator of tree-model device paths
pub const PATH_SEPARATOR: char = '.';

const ONE_LEVEL_WILDCARD: &str = "*";
const MULTI_LEVEL_WILDCARD: &str = "**";

/// A dot-separated path pattern, e.g. `root.sg.**` or `root.*.d1`
///
/// `*` matches exactly one level, `**` matches one or more levels.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct PathPattern(Arc<str>);

impl PathPattern {
    /// Creates a new pattern.
    #[must_use]
    pub fn new<S: Into<Arc<str>>>(pattern: S) -> Self {
        Self(pattern.into())
    }

    /// Returns the raw pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn levels(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR)
    }

    /// Returns `true` if the full `path` matches the pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let pattern: Vec<_> = self.levels().collect();
        let path: Vec<_> = path.split(PATH_SEPARATOR).collect();
        match_levels(&pattern, &path)
    }

    /// Returns `true` if the pattern selects every series of the device at `path`.
    ///
    /// Besides patterns matching the device itself, a trailing wildcard level
    /// selects all series below a device, e.g. `root.sg.d1.**` covers `root.sg.d1`.
    #[must_use]
    pub fn covers_device(&self, path: &str) -> bool {
        let pattern: Vec<_> = self.levels().collect();
        let path: Vec<_> = path.split(PATH_SEPARATOR).collect();

        if match_levels(&pattern, &path) {
            return true;
        }

        match pattern.split_last() {
            Some((&(ONE_LEVEL_WILDCARD | MULTI_LEVEL_WILDCARD), device)) => {
                match_levels(device, &path)
            }
            _ => false,
        }
    }

    /// Ranks how specific the pattern is.
    ///
    /// Literal levels weigh more than any wildcard, so `root.sg.d1`
    /// outranks `root.sg.*` which outranks `root.sg.**`.
    #[must_use]
    pub fn specificity(&self) -> (usize, usize, usize) {
        let mut literals = 0;
        let mut single = 0;
        let mut levels = 0;

        for level in self.levels() {
            levels += 1;

            match level {
                MULTI_LEVEL_WILDCARD => {}
                ONE_LEVEL_WILDCARD => single += 1,
                _ => literals += 1,
            }
        }

        (literals, single, levels)
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PathPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn match_levels(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&MULTI_LEVEL_WILDCARD, rest)) => {
            // ** needs at least one level
            (1..=path.len()).any(|consumed| {
                path.get(consumed..)
                    .is_some_and(|remaining| match_levels(rest, remaining))
            })
        }
        Some((level, rest)) => match path.split_first() {
            Some((head, tail)) => {
                (*level == ONE_LEVEL_WILDCARD || level == head) && match_levels(rest, tail)
            }
            None => false,
        },
    }
}
