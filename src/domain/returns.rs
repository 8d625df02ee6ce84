//! Return engine: daily gain/loss with cash flows removed, chain-linked
//! TWRR, Modified-Dietz money-weighted return and CAGR.
//!
//! For snapshots `0..n` and the cash flow `CF_i` aligned to snapshot `i`:
//!
//! ```text
//! gain_i          = (NW_i - NW_{i-1}) - CF_i
//! start_capital_i = NW_{i-1} + CF_i
//! r_i             = gain_i / start_capital_i        (0 when start_capital_i <= 0)
//! TWRR            = prod(1 + r_i) - 1
//! weighted_cap    = NW_0 + sum(CF_i * ((n-1) - i) / (n-1))
//! dietz           = sum(gain_i) / weighted_cap     (0 when weighted_cap == 0)
//! CAGR            = (1 + TWRR)^(12 / months) - 1   (months = days / 30.4375, >= 1)
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::alignment::AlignedMovement;
use super::valuation::ValuationSnapshot;

/// Average calendar days per month.
pub const DAYS_PER_MONTH: f64 = 30.4375;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    /// Market-driven change in net worth.
    pub gain_loss: f64,
    pub cumulative_gain_loss: f64,
    /// Net movement amount aligned to this date.
    pub cash_flow: f64,
    pub cumulative_cash_flow: f64,
    pub net_worth: f64,
    pub daily_return: f64,
    /// Chain-linked return since the first snapshot (0.05 = 5%).
    pub cumulative_twrr: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodStats {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_gain_loss: f64,
    /// Modified-Dietz return as a fraction.
    pub total_gain_loss_pct: f64,
    pub total_twrr: f64,
    /// `None` when the window spans less than one month.
    pub cagr: Option<f64>,
    pub initial_net_worth: f64,
    pub final_net_worth: f64,
    pub total_net_cash_flow: f64,
    /// Modified-Dietz denominator.
    pub weighted_capital: f64,
    pub records: Vec<DailyRecord>,
}

impl PeriodStats {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sum of aligned movement amounts keyed by effective date.
pub fn cash_flows_by_date(movements: &[AlignedMovement]) -> BTreeMap<NaiveDate, f64> {
    let mut flows = BTreeMap::new();
    for m in movements {
        *flows.entry(m.effective_date).or_insert(0.0) += m.amount;
    }
    flows
}

/// Compute daily records and period aggregates.
///
/// `snapshots` must be strictly increasing by date. Fewer than two
/// snapshots yield a zero-valued result with no records.
pub fn compute_period_stats(
    snapshots: &[ValuationSnapshot],
    movements: &[AlignedMovement],
) -> PeriodStats {
    let (first, last) = match (snapshots.first(), snapshots.last()) {
        (Some(first), Some(last)) if snapshots.len() >= 2 => (first, last),
        _ => return PeriodStats::default(),
    };

    let flows = cash_flows_by_date(movements);
    let flow_on = |date: NaiveDate| flows.get(&date).copied().unwrap_or(0.0);

    let periods = (snapshots.len() - 1) as f64;
    let mut cumulative_gain_loss = 0.0;
    let mut cumulative_cash_flow = flow_on(first.date);
    let mut weighted_capital = first.net_worth;
    let mut growth = 1.0;
    let mut records = Vec::with_capacity(snapshots.len() - 1);

    for (i, pair) in snapshots.windows(2).enumerate() {
        let (prev, curr) = (&pair[0], &pair[1]);
        let index = i + 1;
        let cash_flow = flow_on(curr.date);

        let gain_loss = (curr.net_worth - prev.net_worth) - cash_flow;
        cumulative_gain_loss += gain_loss;
        cumulative_cash_flow += cash_flow;

        let days_remaining = periods - index as f64;
        weighted_capital += cash_flow * (days_remaining / periods);

        let start_capital = prev.net_worth + cash_flow;
        let daily_return = if start_capital > 0.0 {
            gain_loss / start_capital
        } else {
            0.0
        };
        growth *= 1.0 + daily_return;

        records.push(DailyRecord {
            date: curr.date,
            gain_loss,
            cumulative_gain_loss,
            cash_flow,
            cumulative_cash_flow,
            net_worth: curr.net_worth,
            daily_return,
            cumulative_twrr: growth - 1.0,
        });
    }

    let total_gain_loss_pct = if weighted_capital != 0.0 {
        cumulative_gain_loss / weighted_capital
    } else {
        0.0
    };

    PeriodStats {
        start_date: Some(first.date),
        end_date: Some(last.date),
        total_gain_loss: cumulative_gain_loss,
        total_gain_loss_pct,
        total_twrr: growth - 1.0,
        cagr: annualize(growth, first.date, last.date),
        initial_net_worth: first.net_worth,
        final_net_worth: last.net_worth,
        total_net_cash_flow: movements.iter().map(|m| m.amount).sum(),
        weighted_capital,
        records,
    }
}

/// Compound annual growth rate for a growth index over `[start, end]`.
pub fn annualize(growth: f64, start: NaiveDate, end: NaiveDate) -> Option<f64> {
    let months = (end - start).num_days() as f64 / DAYS_PER_MONTH;
    if months < 1.0 {
        return None;
    }
    if growth <= 0.0 {
        return Some(-1.0);
    }
    Some(growth.powf(12.0 / months) - 1.0)
}
