//! Log Analysis Engine
//!
//! This module turns a stream of [`LogEntry`] values plus a
//! [`FilterCriteria`] into a finalized [`AnalysisResult`].
//!
//! ## Per-entry algorithm
//!
//! 1. An entry with a valid date outside the configured range is skipped as
//!    a whole.
//! 2. An entry whose date is missing or unparseable is *not* date-filtered;
//!    its paths are evaluated normally.
//! 3. Every path of a surviving entry is checked independently with
//!    [`FilterCriteria::is_path_allowed`] and counted when allowed.
//!
//! ## Key Types
//!
//! - [`Aggregator`] - Owns the [`PathCounts`] for one run, implements [`EntryProcessor`]
//! - [`LogAnalyzer`] - Opens the input, drives the stream and honours cancellation
//!
//! ## Usage Example
//!
//! ```no_run
//! use svn_churn::analyzer::LogAnalyzer;
//! use svn_churn::filter::FilterCriteria;
//! use std::path::Path;
//!
//! # fn example() -> svn_churn::error::Result<()> {
//! let criteria = FilterCriteria::new(["tags"], [".py"], None, None);
//! let analyzer = LogAnalyzer::new(criteria);
//! let result = analyzer.analyze_file(Path::new("svn-log.xml"))?;
//! println!("{} files touched", result.counts.len());
//! # Ok(())
//! # }
//! ```

use crate::error::{AnalyzerError, Result};
use crate::filter::FilterCriteria;
use crate::interrupt::InterruptFlag;
use crate::models::{AnalysisResult, AnalysisStats, EntryDate, LogEntry, PathCounts};
use crate::parser::{self, EntryProcessor, DEFAULT_BUFFER_SIZE};
use std::path::Path;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Accumulates per-path counts for a single run.
pub struct Aggregator<'a> {
    criteria: &'a FilterCriteria,
    interrupt: Option<InterruptFlag>,
    counts: PathCounts,
    stats: AnalysisStats,
}

impl<'a> Aggregator<'a> {
    pub fn new(criteria: &'a FilterCriteria) -> Self {
        Self {
            criteria,
            interrupt: None,
            counts: PathCounts::new(),
            stats: AnalysisStats::default(),
        }
    }

    /// Abort with [`AnalyzerError::Interrupted`] once `flag` is raised.
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn stats(&self) -> &AnalysisStats {
        &self.stats
    }

    pub fn add_entry(&mut self, entry: &LogEntry) {
        self.stats.entries_read += 1;

        match &entry.date {
            EntryDate::Valid(date) => {
                if !self.criteria.is_date_in_range(*date) {
                    self.stats.entries_skipped_by_date += 1;
                    debug!(revision = ?entry.revision, date = %date, "Entry outside date range");
                    return;
                }
            }
            EntryDate::Missing => {
                self.stats.entries_missing_date += 1;
            }
            EntryDate::Invalid(text) => {
                // Counted without date filtering.
                self.stats.entries_invalid_date += 1;
                debug!(revision = ?entry.revision, date = %text, "Unparseable entry date");
            }
        }

        for path in &entry.paths {
            if self.criteria.is_path_allowed(path) {
                self.counts.increment(path);
                self.stats.paths_counted += 1;
            } else {
                self.stats.paths_rejected += 1;
            }
        }
    }

    pub fn finish(self) -> AnalysisResult {
        AnalysisResult {
            counts: self.counts,
            stats: self.stats,
        }
    }
}

impl EntryProcessor for Aggregator<'_> {
    type Output = AnalysisResult;

    fn process_entry(&mut self, entry: LogEntry) -> Result<()> {
        if self.interrupt.as_ref().is_some_and(InterruptFlag::is_raised) {
            return Err(AnalyzerError::Interrupted);
        }
        self.add_entry(&entry);
        Ok(())
    }

    fn finalize(self) -> Result<Self::Output> {
        Ok(self.finish())
    }
}

pub struct LogAnalyzer {
    criteria: FilterCriteria,
    buffer_size: usize,
    interrupt: Option<InterruptFlag>,
}

impl LogAnalyzer {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            buffer_size: DEFAULT_BUFFER_SIZE,
            interrupt: None,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Stream the log at `path` through the filters.
    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!("analysis", run_id = %run_id, input = %path.display());
        let _guard = span.enter();

        info!(
            match_mode = %self.criteria.match_mode(),
            start = ?self.criteria.start_date(),
            end = ?self.criteria.end_date(),
            "Starting log analysis"
        );

        let result = parser::process_log_file(path, self.buffer_size, self.aggregator())?;
        log_summary(&result.stats, result.counts.len());
        Ok(result)
    }

    /// Run the filters over an already-open entry source.
    pub fn analyze_entries<I>(&self, entries: I) -> Result<AnalysisResult>
    where
        I: IntoIterator<Item = Result<LogEntry>>,
    {
        let result = parser::process_entries(entries, self.aggregator())?;
        log_summary(&result.stats, result.counts.len());
        Ok(result)
    }

    fn aggregator(&self) -> Aggregator<'_> {
        let aggregator = Aggregator::new(&self.criteria);
        match &self.interrupt {
            Some(flag) => aggregator.with_interrupt(flag.clone()),
            None => aggregator,
        }
    }
}

fn log_summary(stats: &AnalysisStats, distinct_paths: usize) {
    info!(
        entries_read = stats.entries_read,
        entries_skipped_by_date = stats.entries_skipped_by_date,
        paths_counted = stats.paths_counted,
        paths_rejected = stats.paths_rejected,
        distinct_paths,
        "Log analysis complete"
    );
    if stats.entries_invalid_date > 0 {
        warn!(
            count = stats.entries_invalid_date,
            "Entries with unparseable dates were counted without date filtering"
        );
    }
}
