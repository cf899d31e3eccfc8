//! Error taxonomy for an analysis run.
//!
//! Access and structural failures are fatal and surface as an
//! [`AnalyzerError`]. Per-record problems (an unparseable date) never reach
//! this type; the aggregator handles them inline.

use std::path::PathBuf;
use thiserror::Error;

/// Exit status for a completed run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for input, parse and configuration failures.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status reserved for user cancellation (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("File '{}' not found.", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Cannot read '{}': {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML Parse Error at byte {position}: {message}")]
    Parse { position: u64, message: String },

    #[error("I/O error while reading log: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled by user.")]
    Interrupted,
}

impl AnalyzerError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AnalyzerError::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, AnalyzerError::Interrupted)
    }
}

pub type Result<T, E = AnalyzerError> = std::result::Result<T, E>;

/// Exit status for an error that ended a run.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<AnalyzerError>().map_or(EXIT_FAILURE, AnalyzerError::exit_code)
}
