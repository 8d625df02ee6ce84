//! CSV file data adapter.
//!
//! Valuations: `date,net_worth,cash_balance,margin_debt`.
//! Movements: `date,amount`.

use crate::domain::error::AnalyticsError;
use crate::domain::valuation::{CashMovement, DateWindow, ValuationSnapshot};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const AUTO_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

pub struct CsvAdapter {
    valuations_path: PathBuf,
    movements_path: PathBuf,
    date_format: Option<String>,
}

impl CsvAdapter {
    pub fn new(valuations_path: PathBuf, movements_path: PathBuf) -> Self {
        Self {
            valuations_path,
            movements_path,
            date_format: None,
        }
    }

    /// Pin dates to one `strftime` pattern. `auto` restores the default of
    /// accepting `YYYY-MM-DD` and `DD/MM/YYYY`.
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = match format.trim() {
            "" | "auto" => None,
            f => Some(f.to_string()),
        };
        self
    }

    fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        match &self.date_format {
            Some(f) => NaiveDate::parse_from_str(raw, f).ok(),
            None => AUTO_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok()),
        }
    }

    fn date(&self, record: &csv::StringRecord, row: &Row) -> Result<NaiveDate, AnalyticsError> {
        let raw = row.field(record, 0, "date")?;
        self.parse_date(raw)
            .ok_or_else(|| row.error(format!("invalid date {:?}", raw)))
    }

    /// Read `path` and hand each data row to `parse_row` with its 1-based
    /// line number.
    fn read_rows<T>(
        &self,
        path: &Path,
        mut parse_row: impl FnMut(&csv::StringRecord, &Row) -> Result<T, AnalyticsError>,
    ) -> Result<Vec<T>, AnalyticsError> {
        let source_name = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| AnalyticsError::DataRead {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut rows = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| AnalyticsError::DataFormat {
                source_name: source_name.clone(),
                line: e.position().map(|p| p.line() as usize).unwrap_or(0),
                reason: format!("CSV parse error: {}", e),
            })?;
            let row = Row {
                source_name: &source_name,
                line: record.position().map(|p| p.line() as usize).unwrap_or(0),
            };
            rows.push(parse_row(&record, &row)?);
        }

        Ok(rows)
    }
}

/// Location of the row being parsed, for error messages.
struct Row<'a> {
    source_name: &'a str,
    line: usize,
}

impl Row<'_> {
    fn error(&self, reason: String) -> AnalyticsError {
        AnalyticsError::DataFormat {
            source_name: self.source_name.to_string(),
            line: self.line,
            reason,
        }
    }

    fn field<'r>(
        &self,
        record: &'r csv::StringRecord,
        index: usize,
        name: &str,
    ) -> Result<&'r str, AnalyticsError> {
        record
            .get(index)
            .ok_or_else(|| self.error(format!("missing {} column", name)))
    }

    fn amount(
        &self,
        record: &csv::StringRecord,
        index: usize,
        name: &str,
    ) -> Result<f64, AnalyticsError> {
        let raw = self.field(record, index, name)?;
        let value: f64 = raw
            .parse()
            .map_err(|e| self.error(format!("invalid {} value {:?}: {}", name, raw, e)))?;
        if !value.is_finite() {
            return Err(self.error(format!("{} must be finite", name)));
        }
        Ok(value)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_valuations(
        &self,
        window: &DateWindow,
    ) -> Result<Vec<ValuationSnapshot>, AnalyticsError> {
        let mut snapshots = self.read_rows(&self.valuations_path, |record, row| {
            Ok(ValuationSnapshot {
                date: self.date(record, row)?,
                net_worth: row.amount(record, 1, "net_worth")?,
                cash_balance: row.amount(record, 2, "cash_balance")?,
                margin_debt: row.amount(record, 3, "margin_debt")?,
            })
        })?;

        snapshots.sort_by_key(|s| s.date);
        if let Some(pair) = snapshots.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(AnalyticsError::DuplicateDate {
                source_name: self.valuations_path.display().to_string(),
                date: pair[0].date,
            });
        }

        let total = snapshots.len();
        snapshots.retain(|s| window.contains(s.date));
        tracing::debug!(
            path = %self.valuations_path.display(),
            total,
            kept = snapshots.len(),
            "loaded valuations"
        );
        Ok(snapshots)
    }

    fn fetch_movements(&self, window: &DateWindow) -> Result<Vec<CashMovement>, AnalyticsError> {
        let mut movements = self.read_rows(&self.movements_path, |record, row| {
            Ok(CashMovement {
                date: self.date(record, row)?,
                amount: row.amount(record, 1, "amount")?,
            })
        })?;

        movements.sort_by_key(|m| m.date);

        let total = movements.len();
        movements.retain(|m| window.contains(m.date));
        tracing::debug!(
            path = %self.movements_path.display(),
            total,
            kept = movements.len(),
            "loaded movements"
        );
        Ok(movements)
    }
}
