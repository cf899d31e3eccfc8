//! Report Rendering
//!
//! This module turns a finalized [`AnalysisResult`] into the ranked report
//! printed on stdout. Two formats are supported:
//!
//! - **Text**: fixed-width `Count | File Path` table with a header that
//!   echoes the active filters and a one-line statistics footer
//! - **JSON**: a single object with the filters, statistics and ranked rows,
//!   for scripting
//!
//! Rows are ordered by count descending, then path ascending, and truncated
//! to the requested limit. Rendering is pure, so the same result and
//! criteria always produce byte-identical output.
//!
//! ## Usage Example
//!
//! ```
//! use svn_churn::display::ReportRenderer;
//! use svn_churn::filter::FilterCriteria;
//! use svn_churn::models::{AnalysisResult, AnalysisStats, PathCounts};
//!
//! let criteria = FilterCriteria::default();
//! let result = AnalysisResult { counts: PathCounts::new(), stats: AnalysisStats::default() };
//! let text = ReportRenderer::new(&criteria, 50).render_text(&result);
//! assert!(text.contains("No matching files found."));
//! ```

use crate::filter::FilterCriteria;
use crate::models::{AnalysisResult, AnalysisStats, ReportRow};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

/// Default number of rows in a report.
pub const DEFAULT_LIMIT: usize = 50;

const RULE_WIDTH: usize = 70;
const COUNT_WIDTH: usize = 8;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json {
        pretty: bool,
    },
}

#[derive(Debug, Serialize)]
struct FilterSummary {
    start_date: Option<String>,
    end_date: Option<String>,
    extensions: Vec<String>,
    exclude: Vec<String>,
    match_mode: String,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    filters: FilterSummary,
    stats: &'a AnalysisStats,
    total_paths: usize,
    files: Vec<ReportRow>,
}

pub struct ReportRenderer<'a> {
    criteria: &'a FilterCriteria,
    limit: usize,
}

impl<'a> ReportRenderer<'a> {
    pub fn new(criteria: &'a FilterCriteria, limit: usize) -> Self {
        Self { criteria, limit }
    }

    pub fn render(&self, result: &AnalysisResult, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text(result)),
            ReportFormat::Json { pretty } => self.render_json(result, pretty),
        }
    }

    /// Render and write to `out`, flushing afterwards.
    pub fn write_to<W: Write>(
        &self,
        out: &mut W,
        result: &AnalysisResult,
        format: ReportFormat,
    ) -> Result<()> {
        let rendered = self.render(result, format)?;
        out.write_all(rendered.as_bytes())
            .context("Failed to write report")?;
        out.flush().context("Failed to flush report")?;
        Ok(())
    }

    pub fn render_text(&self, result: &AnalysisResult) -> String {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        // Writing to a String cannot fail.
        let _ = writeln!(out, "{heavy}");
        let _ = writeln!(out, "SVN Log Analysis Report");
        let _ = writeln!(out, "{heavy}");

        if let Some(start) = self.criteria.start_date() {
            let _ = writeln!(out, "Start Date: {}", start.format(DATE_FORMAT));
        }
        if let Some(end) = self.criteria.end_date() {
            let _ = writeln!(out, "End Date:   {}", end.format(DATE_FORMAT));
        }
        let extensions: Vec<&str> = self.criteria.extensions().collect();
        if !extensions.is_empty() {
            let _ = writeln!(out, "Extensions: {}", extensions.join(", "));
        }
        let excluded: Vec<&str> = self.criteria.exclude_dirs().collect();
        if !excluded.is_empty() {
            let _ = writeln!(out, "Excluded:   {}", excluded.join(", "));
        }
        let _ = writeln!(out, "{light}");

        if result.counts.is_empty() {
            let _ = writeln!(out, "No matching files found.");
            return out;
        }

        let _ = writeln!(out, "{:<width$} | File Path", "Count", width = COUNT_WIDTH);
        let _ = writeln!(out, "{light}");
        for row in result.counts.ranked(self.limit) {
            let _ = writeln!(out, "{:<width$} | {}", row.count, row.path, width = COUNT_WIDTH);
        }
        let _ = writeln!(out, "{light}");
        let _ = writeln!(out, "{}", summary_line(&result.stats, result.counts.len()));

        out
    }

    pub fn render_json(&self, result: &AnalysisResult, pretty: bool) -> Result<String> {
        let report = JsonReport {
            filters: FilterSummary {
                start_date: self.criteria.start_date().map(|d| d.format(DATE_FORMAT).to_string()),
                end_date: self.criteria.end_date().map(|d| d.format(DATE_FORMAT).to_string()),
                extensions: self.criteria.extensions().map(str::to_string).collect(),
                exclude: self.criteria.exclude_dirs().map(str::to_string).collect(),
                match_mode: self.criteria.match_mode().to_string(),
            },
            stats: &result.stats,
            total_paths: result.counts.len(),
            files: result.counts.ranked(self.limit),
        };

        let mut json = if pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        }
        .context("Failed to serialize report")?;
        json.push('\n');
        Ok(json)
    }
}

fn summary_line(stats: &AnalysisStats, distinct_paths: usize) -> String {
    format!(
        "Entries: {} read, {} skipped by date | Paths: {} counted, {} rejected | Files: {}",
        stats.entries_read,
        stats.entries_skipped_by_date,
        stats.paths_counted,
        stats.paths_rejected,
        distinct_paths
    )
}
