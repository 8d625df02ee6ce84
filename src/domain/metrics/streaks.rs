//! Longest uninterrupted rises and drops in daily gain/loss.
//!
//! A drop run is a maximal stretch of days with `gain_loss <= 0`, a rise
//! run one with `gain_loss >= 0`. Flat days belong to both. The longest
//! drop is the run with the most negative sum and the longest rise the
//! one with the largest sum; on equal sums the earlier run is kept.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::returns::DailyRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Streak {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: usize,
    pub sum: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Streaks {
    pub longest_rise: Option<Streak>,
    pub longest_drop: Option<Streak>,
}

pub fn longest_streaks(records: &[DailyRecord]) -> Streaks {
    let longest_drop = runs(records, |g| g <= 0.0)
        .into_iter()
        .reduce(|best, run| if run.sum < best.sum { run } else { best });
    let longest_rise = runs(records, |g| g >= 0.0)
        .into_iter()
        .reduce(|best, run| if run.sum > best.sum { run } else { best });

    Streaks {
        longest_rise,
        longest_drop,
    }
}

/// Maximal runs of consecutive records whose gain/loss satisfies `include`.
fn runs(records: &[DailyRecord], include: impl Fn(f64) -> bool) -> Vec<Streak> {
    let mut out = Vec::new();
    let mut current: Option<Streak> = None;

    for r in records {
        if include(r.gain_loss) {
            let run = current.get_or_insert(Streak {
                start: r.date,
                end: r.date,
                days: 0,
                sum: 0.0,
            });
            run.end = r.date;
            run.days += 1;
            run.sum += r.gain_loss;
        } else if let Some(run) = current.take() {
            out.push(run);
        }
    }
    out.extend(current);
    out
}
