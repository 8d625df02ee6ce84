//! Report generation port trait.

use crate::domain::analysis::Analysis;
use crate::domain::error::AnalyticsError;

/// Port for writing analysis reports.
pub trait ReportPort {
    /// Write `analysis` to `output_path`. `-` means stdout.
    fn write(&self, analysis: &Analysis, output_path: &str) -> Result<(), AnalyticsError>;
}
