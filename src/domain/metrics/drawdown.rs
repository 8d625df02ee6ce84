//! Drawdown series over the TWRR growth index.
//!
//! DD[i] = (G[i] - max(G[0..=i])) / max(G[0..=i]) * 100, with G = 1 + TWRR.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::returns::DailyRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    /// Percent below the running peak (0 or negative).
    pub drawdown_pct: f64,
}

pub fn drawdown_series(records: &[DailyRecord]) -> Vec<DrawdownPoint> {
    let mut peak = f64::NEG_INFINITY;
    records
        .iter()
        .map(|r| {
            let index = 1.0 + r.cumulative_twrr;
            peak = peak.max(index);
            DrawdownPoint {
                date: r.date,
                drawdown_pct: (index - peak) / peak * 100.0,
            }
        })
        .collect()
}

/// Deepest point of a drawdown series, 0 when empty.
pub fn max_drawdown(series: &[DrawdownPoint]) -> f64 {
    series
        .iter()
        .map(|p| p.drawdown_pct)
        .fold(0.0, f64::min)
}
