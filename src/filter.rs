//! Entry and path filtering
//!
//! [`FilterCriteria`] is built once from configuration and is read-only
//! afterwards. Normalization happens in [`FilterCriteria::new`]; the
//! predicates assume normalized state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '/';

/// How an exclusion rule is compared against a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// `/tags` excludes `/tags` and `/tags/...` but not `/tagsfoo/...`.
    #[default]
    Segment,
    /// Plain string prefix, so `/tags` also excludes `/tagsfoo/...`.
    Prefix,
}

impl FromStr for MatchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "segment" => Ok(MatchMode::Segment),
            "prefix" => Ok(MatchMode::Prefix),
            other => anyhow::bail!("Unknown match mode '{}', expected 'segment' or 'prefix'", other),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Segment => write!(f, "segment"),
            MatchMode::Prefix => write!(f, "prefix"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    exclude_dirs: BTreeSet<String>,
    extensions: BTreeSet<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    match_mode: MatchMode,
}

impl FilterCriteria {
    pub fn new<E, X>(
        exclude_dirs: E,
        extensions: X,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        X: IntoIterator,
        X::Item: AsRef<str>,
    {
        let exclude_dirs = exclude_dirs
            .into_iter()
            .map(|d| normalize_exclusion(d.as_ref()))
            .collect();
        let extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .collect();

        Self {
            exclude_dirs,
            extensions,
            start_date,
            end_date,
            match_mode: MatchMode::default(),
        }
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn exclude_dirs(&self) -> impl Iterator<Item = &str> {
        self.exclude_dirs.iter().map(String::as_str)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Both bounds are inclusive.
    pub fn is_date_in_range(&self, date: DateTime<Utc>) -> bool {
        if self.start_date.is_some_and(|start| date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| date > end) {
            return false;
        }
        true
    }

    pub fn is_path_allowed(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }

        if self.exclude_dirs.iter().any(|dir| self.is_excluded_by(path, dir)) {
            return false;
        }

        if !self.extensions.is_empty() {
            let lowered = path.to_lowercase();
            if !self.extensions.iter().any(|ext| lowered.ends_with(ext.as_str())) {
                return false;
            }
        }

        true
    }

    fn is_excluded_by(&self, path: &str, dir: &str) -> bool {
        match self.match_mode {
            MatchMode::Prefix => path.starts_with(dir),
            MatchMode::Segment => match path.strip_prefix(dir) {
                Some(rest) => {
                    rest.is_empty() || rest.starts_with(SEPARATOR) || dir.ends_with(SEPARATOR)
                }
                None => false,
            },
        }
    }
}

fn normalize_exclusion(raw: &str) -> String {
    if raw.starts_with(SEPARATOR) {
        raw.to_string()
    } else {
        format!("{SEPARATOR}{raw}")
    }
}

fn normalize_extension(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    if lowered.starts_with('.') {
        lowered
    } else {
        format!(".{lowered}")
    }
}
