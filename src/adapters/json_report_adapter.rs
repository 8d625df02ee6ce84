//! JSON report adapter implementing ReportPort.
//!
//! Serializes the whole `Analysis` so downstream tools can chart it.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::domain::analysis::Analysis;
use crate::domain::error::AnalyticsError;
use crate::ports::report_port::ReportPort;

/// Output path that selects stdout.
pub const STDOUT_PATH: &str = "-";

#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, analysis: &Analysis) -> Result<String, AnalyticsError> {
        serde_json::to_string_pretty(analysis).map_err(|e| AnalyticsError::Report {
            reason: format!("failed to serialize analysis: {}", e),
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, analysis: &Analysis, output_path: &str) -> Result<(), AnalyticsError> {
        let json = self.render(analysis)?;

        if output_path == STDOUT_PATH {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
            return Ok(());
        }

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(AnalyticsError::Io)?;
        }
        fs::write(path, json).map_err(AnalyticsError::Io)?;
        tracing::debug!(path = output_path, "wrote JSON report");

        Ok(())
    }
}
