//! Domain error types.
//!
//! The analytics engine itself is total over well-formed input and never
//! returns these; they come from configuration, ingestion and reporting.

use chrono::NaiveDate;

/// Top-level error type for portfolio-analyzer.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to read {source_name}: {reason}")]
    DataRead { source_name: String, reason: String },

    #[error("{source_name} line {line}: {reason}")]
    DataFormat {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("{source_name}: more than one valuation on {date}")]
    DuplicateDate { source_name: String, date: NaiveDate },

    #[error("invalid date window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AnalyticsError> for std::process::ExitCode {
    fn from(err: &AnalyticsError) -> Self {
        let code: u8 = match err {
            AnalyticsError::Io(_) => 1,
            AnalyticsError::ConfigParse { .. }
            | AnalyticsError::ConfigMissing { .. }
            | AnalyticsError::ConfigInvalid { .. } => 2,
            AnalyticsError::DataRead { .. }
            | AnalyticsError::DataFormat { .. }
            | AnalyticsError::DuplicateDate { .. } => 3,
            AnalyticsError::InvalidWindow { .. } => 4,
            AnalyticsError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
