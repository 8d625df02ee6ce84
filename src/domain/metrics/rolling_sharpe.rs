//! Rolling annualized Sharpe ratio (risk-free rate 0).
//!
//! Daily returns are recovered from consecutive TWRR index values:
//! r[0] = TWRR[0], r[i] = (1 + TWRR[i]) / (1 + TWRR[i-1]) - 1, or 0 once the
//! index has hit zero.
//! The point at day i (i >= W) uses the W returns before it:
//! SHARPE[i] = mean(r[i-W..i]) / pstdev(r[i-W..i]) * sqrt(252).

use chrono::NaiveDate;
use serde::Serialize;

use super::twrr_between;
use crate::domain::returns::DailyRecord;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_SHARPE_WINDOW: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharpePoint {
    pub date: NaiveDate,
    pub sharpe: f64,
}

pub fn daily_returns(records: &[DailyRecord]) -> Vec<f64> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| match i {
            0 => r.cumulative_twrr,
            _ => twrr_between(records[i - 1].cumulative_twrr, r.cumulative_twrr),
        })
        .collect()
}

/// One point per day from index `window` on; empty with fewer than
/// `window + 1` records.
///
/// # Panics
///
/// Panics if `window` is zero.
pub fn rolling_sharpe(records: &[DailyRecord], window: usize) -> Vec<SharpePoint> {
    assert!(window > 0, "rolling Sharpe window must be at least 1");

    let returns = daily_returns(records);
    (window..records.len())
        .map(|i| SharpePoint {
            date: records[i].date,
            sharpe: annualized_sharpe(&returns[i - window..i]),
        })
        .collect()
}

fn annualized_sharpe(returns: &[f64]) -> f64 {
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev != 0.0 {
        (mean / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
