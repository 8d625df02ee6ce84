//! Valuation snapshots, cash movements and analysis windows.
//!
//! A valuation series is ordered by strictly increasing date with one
//! snapshot per date. The ingestion side enforces this; everything in
//! `domain` assumes it.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::AnalyticsError;

/// End-of-day state of the whole portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationSnapshot {
    pub date: NaiveDate,
    /// Assets + cash - liabilities.
    pub net_worth: f64,
    pub cash_balance: f64,
    /// Outstanding financing balance (a liability).
    pub margin_debt: f64,
}

impl ValuationSnapshot {
    pub fn new(date: NaiveDate, net_worth: f64, cash_balance: f64, margin_debt: f64) -> Self {
        Self {
            date,
            net_worth,
            cash_balance,
            margin_debt,
        }
    }
}

/// External deposit (positive) or withdrawal (negative).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashMovement {
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashMovement {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Inclusive date range selecting the slice of input to analyse.
/// A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, AnalyticsError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AnalyticsError::InvalidWindow { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Window with no bounds.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    pub fn slice_valuations(&self, snapshots: &[ValuationSnapshot]) -> Vec<ValuationSnapshot> {
        snapshots
            .iter()
            .filter(|s| self.contains(s.date))
            .cloned()
            .collect()
    }

    pub fn slice_movements(&self, movements: &[CashMovement]) -> Vec<CashMovement> {
        movements
            .iter()
            .filter(|m| self.contains(m.date))
            .cloned()
            .collect()
    }
}

/// Absolute distance between two dates in calendar days.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn window_rejects_reversed_bounds() {
        let result = DateWindow::new(Some(d(2024, 2, 1)), Some(d(2024, 1, 1)));
        assert!(matches!(result, Err(AnalyticsError::InvalidWindow { .. })));
    }

    #[test]
    fn window_single_day_is_valid() {
        let w = DateWindow::new(Some(d(2024, 2, 1)), Some(d(2024, 2, 1))).unwrap();
        assert!(w.contains(d(2024, 2, 1)));
        assert!(!w.contains(d(2024, 2, 2)));
    }

    #[test]
    fn open_window_contains_everything() {
        let w = DateWindow::all();
        assert!(w.contains(d(1970, 1, 1)));
        assert!(w.contains(d(2100, 12, 31)));
    }

    #[test]
    fn slices_are_inclusive() {
        let snaps: Vec<_> = (1..=5)
            .map(|i| ValuationSnapshot::new(d(2024, 1, i), 100.0 * i as f64, 0.0, 0.0))
            .collect();
        let moves = vec![
            CashMovement::new(d(2024, 1, 1), 10.0),
            CashMovement::new(d(2024, 1, 3), 20.0),
            CashMovement::new(d(2024, 1, 5), 30.0),
        ];
        let w = DateWindow::new(Some(d(2024, 1, 2)), Some(d(2024, 1, 4))).unwrap();

        let sliced = w.slice_valuations(&snaps);
        assert_eq!(sliced.len(), 3);
        assert_eq!(sliced[0].date, d(2024, 1, 2));
        assert_eq!(sliced[2].date, d(2024, 1, 4));

        let sliced = w.slice_movements(&moves);
        assert_eq!(sliced, vec![CashMovement::new(d(2024, 1, 3), 20.0)]);
    }

    #[test]
    fn days_between_is_symmetric() {
        assert_eq!(days_between(d(2024, 1, 1), d(2024, 1, 4)), 3);
        assert_eq!(days_between(d(2024, 1, 4), d(2024, 1, 1)), 3);
        assert_eq!(days_between(d(2024, 2, 28), d(2024, 3, 1)), 2);
    }
}
