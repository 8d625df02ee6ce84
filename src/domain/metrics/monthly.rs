//! Monthly return table with compounded yearly totals.

use chrono::Datelike;
use serde::Serialize;

use super::twrr_between;
use crate::domain::returns::DailyRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    /// Fraction, 0.01 = 1%.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyReturn {
    pub year: i32,
    /// Product of (1 + monthly) minus one.
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyTable {
    pub months: Vec<MonthlyReturn>,
    pub years: Vec<YearlyReturn>,
}

#[cfg(test)]
impl MonthlyTable {
    pub fn month(&self, year: i32, month: u32) -> Option<f64> {
        self.months
            .iter()
            .find(|m| m.year == year && m.month == month)
            .map(|m| m.value)
    }

    pub fn year(&self, year: i32) -> Option<f64> {
        self.years.iter().find(|y| y.year == year).map(|y| y.value)
    }
}

/// Group records by calendar month, in date order.
///
/// Each month runs from the TWRR index at the end of the prior record (0
/// before the first record) to the index at its own last record.
pub fn monthly_returns(records: &[DailyRecord]) -> MonthlyTable {
    // (year, month, twrr at start, twrr at end)
    let mut groups: Vec<(i32, u32, f64, f64)> = Vec::new();
    let mut prior_twrr = 0.0;

    for r in records {
        let key = (r.date.year(), r.date.month());
        match groups.last_mut() {
            Some(g) if (g.0, g.1) == key => g.3 = r.cumulative_twrr,
            _ => groups.push((key.0, key.1, prior_twrr, r.cumulative_twrr)),
        }
        prior_twrr = r.cumulative_twrr;
    }

    let months: Vec<MonthlyReturn> = groups
        .into_iter()
        .map(|(year, month, start, end)| MonthlyReturn {
            year,
            month,
            value: twrr_between(start, end),
        })
        .collect();

    let mut years: Vec<YearlyReturn> = Vec::new();
    for m in &months {
        match years.last_mut() {
            Some(y) if y.year == m.year => y.value = (1.0 + y.value) * (1.0 + m.value) - 1.0,
            _ => years.push(YearlyReturn {
                year: m.year,
                value: m.value,
            }),
        }
    }

    MonthlyTable { months, years }
}
