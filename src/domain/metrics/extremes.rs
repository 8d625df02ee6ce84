//! Best and worst single day by gain/loss.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::returns::DailyRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayExtreme {
    pub date: NaiveDate,
    pub gain_loss: f64,
}

/// Largest daily gain; earliest wins ties.
pub fn best_day(records: &[DailyRecord]) -> Option<DayExtreme> {
    records
        .iter()
        .reduce(|best, r| if r.gain_loss > best.gain_loss { r } else { best })
        .map(to_extreme)
}

/// Largest daily loss; earliest wins ties.
pub fn worst_day(records: &[DailyRecord]) -> Option<DayExtreme> {
    records
        .iter()
        .reduce(|worst, r| if r.gain_loss < worst.gain_loss { r } else { worst })
        .map(to_extreme)
}

fn to_extreme(r: &DailyRecord) -> DayExtreme {
    DayExtreme {
        date: r.date,
        gain_loss: r.gain_loss,
    }
}
