//! Longest time between two successive highs of cumulative gain/loss.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::returns::DailyRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recovery {
    /// Calendar days from the old high to the record that beat it.
    pub days: i64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// The first record sets the initial high. Each time cumulative gain/loss
/// strictly exceeds the current high, the elapsed span since that high is
/// a candidate; the longest one wins (earliest on ties).
pub fn longest_recovery(records: &[DailyRecord]) -> Recovery {
    let Some(first) = records.first() else {
        return Recovery::default();
    };

    let mut peak = first.cumulative_gain_loss;
    let mut peak_date = first.date;
    let mut longest = Recovery::default();

    for r in &records[1..] {
        if r.cumulative_gain_loss > peak {
            let days = (r.date - peak_date).num_days();
            if days > longest.days {
                longest = Recovery {
                    days,
                    start: Some(peak_date),
                    end: Some(r.date),
                };
            }
            peak = r.cumulative_gain_loss;
            peak_date = r.date;
        }
    }

    longest
}
