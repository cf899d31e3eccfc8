//! SVN Churn Library
//!
//! Streaming analysis of `svn log --xml --verbose` exports. The library reads
//! a change history of any size with a fixed memory footprint, filters
//! entries by date and paths by directory and extension, and ranks files by
//! how often they were touched.
//!
//! ## Architecture Overview
//!
//! - [`filter`] - Normalized exclusion, extension and date-range rules
//! - [`parser`] - Pull-based XML reader yielding one [`LogEntry`] at a time
//! - [`analyzer`] - Aggregation of per-path counts and run statistics
//! - [`display`] - Ranked text and JSON reports
//! - [`models`] - Entries, counts and statistics
//! - [`config`] - Configuration file and environment overrides
//! - [`logging`] - Structured logging setup
//! - [`interrupt`] - Ctrl-C handling
//! - [`error`] - Error taxonomy and exit codes
//!
//! ## Main Entry Point
//!
//! ```no_run
//! use svn_churn::{analyze_log, FilterCriteria};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let criteria = FilterCriteria::new(["tags", "branches"], [".rs"], None, None);
//! let result = analyze_log(Path::new("svn-log.xml"), &criteria)?;
//! print!("{}", svn_churn::render_report(&result, &criteria, 20));
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod display;
pub mod error;
pub mod filter;
pub mod interrupt;
pub mod logging;
pub mod models;
pub mod parser;
pub mod timestamp_parser;

pub use analyzer::{Aggregator, LogAnalyzer};
pub use display::{ReportFormat, ReportRenderer};
pub use error::AnalyzerError;
pub use filter::{FilterCriteria, MatchMode};
pub use models::*;

use std::path::Path;

/// Stream the log at `path` through `criteria` and return the finalized counts.
pub fn analyze_log(path: &Path, criteria: &FilterCriteria) -> error::Result<AnalysisResult> {
    LogAnalyzer::new(criteria.clone()).analyze_file(path)
}

/// Render the text report for `result` with at most `limit` rows.
pub fn render_report(result: &AnalysisResult, criteria: &FilterCriteria, limit: usize) -> String {
    ReportRenderer::new(criteria, limit).render_text(result)
}
