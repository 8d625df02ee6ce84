#![allow(dead_code)]

use chrono::NaiveDate;
use portfolio_analyzer::domain::analysis::Analysis;
use portfolio_analyzer::domain::error::AnalyticsError;
pub use portfolio_analyzer::domain::valuation::{CashMovement, DateWindow, ValuationSnapshot};
use portfolio_analyzer::ports::data_port::DataPort;
use portfolio_analyzer::ports::report_port::ReportPort;
use std::cell::RefCell;

pub struct MockDataPort {
    pub valuations: Vec<ValuationSnapshot>,
    pub movements: Vec<CashMovement>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            valuations: Vec::new(),
            movements: Vec::new(),
            error: None,
        }
    }

    pub fn with_valuations(mut self, valuations: Vec<ValuationSnapshot>) -> Self {
        self.valuations = valuations;
        self
    }

    pub fn with_movements(mut self, movements: Vec<CashMovement>) -> Self {
        self.movements = movements;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    fn check(&self) -> Result<(), AnalyticsError> {
        match &self.error {
            Some(reason) => Err(AnalyticsError::DataRead {
                source_name: "mock".into(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_valuations(
        &self,
        window: &DateWindow,
    ) -> Result<Vec<ValuationSnapshot>, AnalyticsError> {
        self.check()?;
        Ok(window.slice_valuations(&self.valuations))
    }

    fn fetch_movements(&self, window: &DateWindow) -> Result<Vec<CashMovement>, AnalyticsError> {
        self.check()?;
        Ok(window.slice_movements(&self.movements))
    }
}

/// Records every write instead of touching the filesystem.
pub struct MockReportPort {
    pub calls: RefCell<Vec<(Analysis, String)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(&self, analysis: &Analysis, output_path: &str) -> Result<(), AnalyticsError> {
        self.calls
            .borrow_mut()
            .push((analysis.clone(), output_path.to_string()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Snapshot with no margin and all value held as cash.
pub fn cash_snapshot(date: &str, net_worth: f64) -> ValuationSnapshot {
    ValuationSnapshot::new(parse_date(date), net_worth, net_worth, 0.0)
}

pub fn snapshot(date: &str, net_worth: f64, cash: f64, margin: f64) -> ValuationSnapshot {
    ValuationSnapshot::new(parse_date(date), net_worth, cash, margin)
}

pub fn movement(date: &str, amount: f64) -> CashMovement {
    CashMovement::new(parse_date(date), amount)
}

/// Daily snapshots from `start` with the given net worths, cash held flat.
pub fn daily_series(start: NaiveDate, net_worths: &[f64]) -> Vec<ValuationSnapshot> {
    net_worths
        .iter()
        .enumerate()
        .map(|(i, &nw)| {
            ValuationSnapshot::new(start + chrono::Days::new(i as u64), nw, 0.0, 0.0)
        })
        .collect()
}

pub const VALUATIONS_HEADER: &str = "date,net_worth,cash_balance,margin_debt";
pub const MOVEMENTS_HEADER: &str = "date,amount";

pub fn valuations_csv(rows: &[ValuationSnapshot]) -> String {
    let mut out = format!("{}\n", VALUATIONS_HEADER);
    for s in rows {
        out.push_str(&format!(
            "{},{},{},{}\n",
            s.date, s.net_worth, s.cash_balance, s.margin_debt
        ));
    }
    out
}

pub fn movements_csv(rows: &[CashMovement]) -> String {
    let mut out = format!("{}\n", MOVEMENTS_HEADER);
    for m in rows {
        out.push_str(&format!("{},{}\n", m.date, m.amount));
    }
    out
}
