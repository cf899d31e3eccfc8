//! Core Data Models
//!
//! This module defines the data structures that flow through the analysis
//! pipeline, from a single streamed log record to the finalized tally.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`LogEntry`] - One `logentry` record produced by the streaming parser
//! 2. **Aggregation**: [`PathCounts`] - Per-path change tally, mutated while entries stream
//! 3. **Output**: [`ReportRow`] - Ranked, serializable rows handed to the reporter
//!
//! [`AnalysisStats`] travels alongside the counts and records what the
//! filters did to the input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State of the `<date>` field of a log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryDate {
    /// Parsed and normalized to UTC.
    Valid(DateTime<Utc>),
    /// Element absent or empty.
    Missing,
    /// Element present but the text could not be parsed.
    Invalid(String),
}

impl EntryDate {
    pub fn valid(&self) -> Option<DateTime<Utc>> {
        match self {
            EntryDate::Valid(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// One historical change record. Constructed by the parser and consumed
/// immediately by the aggregator; never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// `revision` attribute, kept for diagnostics only.
    pub revision: Option<u64>,
    pub date: EntryDate,
    /// Touched paths in document order.
    pub paths: Vec<String>,
}

/// A single ranked line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub path: String,
    pub count: u64,
}

/// Mapping from path to the number of times it was touched.
///
/// Mutable only through [`PathCounts::increment`] while streaming; reporting
/// goes through [`PathCounts::ranked`], which orders rows by count descending
/// and then by path ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathCounts {
    counts: HashMap<String, u64>,
}

impl PathCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, path: &str) {
        // Avoid allocating a key for paths already seen.
        if let Some(count) = self.counts.get_mut(path) {
            *count += 1;
        } else {
            self.counts.insert(path.to_string(), 1);
        }
    }

    pub fn get(&self, path: &str) -> u64 {
        self.counts.get(path).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The `limit` highest-count rows, ties broken by path ascending.
    pub fn ranked(&self, limit: usize) -> Vec<ReportRow> {
        let mut rows: Vec<(&String, &u64)> = self.counts.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        rows.into_iter()
            .take(limit)
            .map(|(path, count)| ReportRow {
                path: path.clone(),
                count: *count,
            })
            .collect()
    }
}

/// What the filters did to the input during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub entries_read: u64,
    pub entries_skipped_by_date: u64,
    pub entries_missing_date: u64,
    pub entries_invalid_date: u64,
    pub paths_counted: u64,
    pub paths_rejected: u64,
}

/// Finalized result of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub counts: PathCounts,
    pub stats: AnalysisStats,
}
