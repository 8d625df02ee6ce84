//! Derived metrics over the daily record stream.
//!
//! Every transform is a pure function of `&[DailyRecord]` and independent
//! of the others.

pub mod drawdown;
pub mod extremes;
pub mod monthly;
pub mod recovery;
pub mod rolling_sharpe;
pub mod streaks;

use serde::Serialize;

use self::drawdown::{drawdown_series, max_drawdown, DrawdownPoint};
use self::extremes::{best_day, worst_day, DayExtreme};
use self::monthly::{monthly_returns, MonthlyTable};
use self::recovery::{longest_recovery, Recovery};
use self::rolling_sharpe::{rolling_sharpe, SharpePoint};
use self::streaks::{longest_streaks, Streaks};
use crate::domain::returns::DailyRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub drawdown: Vec<DrawdownPoint>,
    /// Deepest drawdown in percent (0 or negative).
    pub max_drawdown_pct: f64,
    pub sharpe_window: usize,
    pub rolling_sharpe: Vec<SharpePoint>,
    pub monthly: MonthlyTable,
    pub streaks: Streaks,
    pub recovery: Recovery,
    pub best_day: Option<DayExtreme>,
    pub worst_day: Option<DayExtreme>,
}

impl DerivedMetrics {
    /// # Panics
    ///
    /// Panics if `sharpe_window` is zero.
    pub fn compute(records: &[DailyRecord], sharpe_window: usize) -> Self {
        let drawdown = drawdown_series(records);
        let max_drawdown_pct = max_drawdown(&drawdown);

        DerivedMetrics {
            drawdown,
            max_drawdown_pct,
            sharpe_window,
            rolling_sharpe: rolling_sharpe(records, sharpe_window),
            monthly: monthly_returns(records),
            streaks: longest_streaks(records),
            recovery: longest_recovery(records),
            best_day: best_day(records),
            worst_day: worst_day(records),
        }
    }
}

/// Return between two cumulative TWRR values. A wiped-out index
/// (`1 + start <= 0`) has no defined ratio and counts as 0.
pub fn twrr_between(start: f64, end: f64) -> f64 {
    let base = 1.0 + start;
    if base <= 0.0 {
        return 0.0;
    }
    (1.0 + end) / base - 1.0
}
