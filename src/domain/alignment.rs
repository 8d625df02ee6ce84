//! Movement-to-valuation-date alignment.
//!
//! Reported movement dates are unreliable: settlement lag, weekends and
//! bookkeeping noise mean a deposit dated Monday may only show up in the
//! Wednesday valuation. Each movement is matched against every adjacent
//! snapshot pair `(curr, next)` whose `next.date` lies within
//! `window_days` of the movement date, and the best candidate is chosen by
//! a fixed priority:
//!
//! ```text
//! same-day exact > same-day approximate > window exact > closest date > unmatched
//! ```
//!
//! Candidate collection and resolution are separate pure steps so the
//! priority order can be exercised on its own.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::valuation::{days_between, CashMovement, ValuationSnapshot};

pub const DEFAULT_WINDOW_DAYS: i64 = 3;
pub const DEFAULT_EXACT_TOLERANCE: f64 = 0.01;
pub const DEFAULT_APPROX_TOLERANCE_PCT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentConfig {
    /// Largest date distance, in days, between a movement and the `next`
    /// snapshot of a candidate pair.
    pub window_days: i64,
    /// Absolute currency tolerance for an exact delta match.
    pub exact_tolerance: f64,
    /// Relative tolerance (of `|amount|`) for a same-day net worth match.
    pub approx_tolerance_pct: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            exact_tolerance: DEFAULT_EXACT_TOLERANCE,
            approx_tolerance_pct: DEFAULT_APPROX_TOLERANCE_PCT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    ExactSameDay,
    ApproxSameDay,
    ExactWindow,
    ClosestFallback,
    Unmatched,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::ExactSameDay => "exact-same-day",
            MatchKind::ApproxSameDay => "approx-same-day",
            MatchKind::ExactWindow => "exact-window",
            MatchKind::ClosestFallback => "closest-fallback",
            MatchKind::Unmatched => "unmatched",
        }
    }

    /// Whether the caller should be told about this match.
    pub fn is_weak(&self) -> bool {
        matches!(self, MatchKind::ClosestFallback | MatchKind::Unmatched)
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which balance change between two snapshots explained the movement.
/// Declaration order is match priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeltaSource {
    NetWorth,
    Combined,
    Cash,
    Margin,
}

/// Balance changes from `curr` to `next`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairDeltas {
    pub cash: f64,
    /// Debt repaid counts positive.
    pub margin: f64,
    pub combined: f64,
    pub net_worth: f64,
}

impl PairDeltas {
    pub fn between(curr: &ValuationSnapshot, next: &ValuationSnapshot) -> Self {
        let cash = next.cash_balance - curr.cash_balance;
        let margin = curr.margin_debt - next.margin_debt;
        Self {
            cash,
            margin,
            combined: cash + margin,
            net_worth: next.net_worth - curr.net_worth,
        }
    }

    /// Highest-priority delta within `tolerance` of `amount`.
    pub fn exact_match(&self, amount: f64, tolerance: f64) -> Option<DeltaSource> {
        [
            (DeltaSource::NetWorth, self.net_worth),
            (DeltaSource::Combined, self.combined),
            (DeltaSource::Cash, self.cash),
            (DeltaSource::Margin, self.margin),
        ]
        .into_iter()
        .find(|(_, delta)| (delta - amount).abs() <= tolerance)
        .map(|(source, _)| source)
    }
}

/// Best candidate of each tier found for one movement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidates {
    pub same_day_exact: Option<(NaiveDate, DeltaSource)>,
    /// Date and `|net_worth_delta - amount|`.
    pub approx_same_day: Option<(NaiveDate, f64)>,
    /// Date, source and distance in days from the movement date.
    pub window_exact: Option<(NaiveDate, DeltaSource, i64)>,
    /// Nearest snapshot date and its distance in days.
    pub closest: Option<(NaiveDate, i64)>,
}

/// Outcome of alignment for one movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    ExactSameDay {
        date: NaiveDate,
        source: DeltaSource,
    },
    ApproxSameDay {
        date: NaiveDate,
        difference: f64,
    },
    ExactWindow {
        date: NaiveDate,
        source: DeltaSource,
        distance_days: i64,
    },
    ClosestFallback {
        date: NaiveDate,
        distance_days: i64,
    },
    Unmatched,
}

impl Resolution {
    pub fn kind(&self) -> MatchKind {
        match self {
            Resolution::ExactSameDay { .. } => MatchKind::ExactSameDay,
            Resolution::ApproxSameDay { .. } => MatchKind::ApproxSameDay,
            Resolution::ExactWindow { .. } => MatchKind::ExactWindow,
            Resolution::ClosestFallback { .. } => MatchKind::ClosestFallback,
            Resolution::Unmatched => MatchKind::Unmatched,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match *self {
            Resolution::ExactSameDay { date, .. }
            | Resolution::ApproxSameDay { date, .. }
            | Resolution::ExactWindow { date, .. }
            | Resolution::ClosestFallback { date, .. } => Some(date),
            Resolution::Unmatched => None,
        }
    }

    pub fn source(&self) -> Option<DeltaSource> {
        match *self {
            Resolution::ExactSameDay { source, .. } | Resolution::ExactWindow { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// A cash movement with the valuation date it was judged to affect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedMovement {
    /// Date as reported.
    pub date: NaiveDate,
    pub amount: f64,
    pub effective_date: NaiveDate,
    pub match_kind: MatchKind,
    pub delta_source: Option<DeltaSource>,
}

/// Non-fatal note about a movement without a strong match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentWarning {
    pub date: NaiveDate,
    pub amount: f64,
    pub match_kind: MatchKind,
    pub effective_date: NaiveDate,
    pub reason: String,
}

impl fmt::Display for AlignmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "movement on {} of {:.2}: {} (assigned {})",
            self.date, self.amount, self.reason, self.effective_date
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Alignment {
    pub movements: Vec<AlignedMovement>,
    pub warnings: Vec<AlignmentWarning>,
}

/// Scan the valuation series for every tier of candidate.
///
/// Ties within a tier keep the earliest pair (or snapshot).
pub fn collect_candidates(
    movement: &CashMovement,
    snapshots: &[ValuationSnapshot],
    config: &AlignmentConfig,
) -> Candidates {
    let amount = movement.amount;

    // (next.date, distance in days, deltas) for every pair inside the window.
    let in_window: Vec<(NaiveDate, i64, PairDeltas)> = snapshots
        .windows(2)
        .filter_map(|pair| {
            let distance = days_between(pair[1].date, movement.date);
            (distance <= config.window_days)
                .then(|| (pair[1].date, distance, PairDeltas::between(&pair[0], &pair[1])))
        })
        .collect();

    let exact = in_window.iter().filter_map(|&(date, distance, deltas)| {
        deltas
            .exact_match(amount, config.exact_tolerance)
            .map(|source| (date, source, distance))
    });

    let same_day_exact = exact
        .clone()
        .find(|&(_, _, distance)| distance == 0)
        .map(|(date, source, _)| (date, source));

    let window_exact = exact
        .filter(|&(_, _, distance)| distance > 0)
        .min_by_key(|&(_, _, distance)| distance);

    let band = config.approx_tolerance_pct * amount.abs();
    let approx_same_day = in_window
        .iter()
        .filter(|&&(_, distance, deltas)| {
            distance == 0 && deltas.exact_match(amount, config.exact_tolerance).is_none()
        })
        .map(|&(date, _, deltas)| (date, (deltas.net_worth - amount).abs()))
        .filter(|&(_, difference)| difference <= band)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let closest = snapshots
        .iter()
        .map(|s| (s.date, days_between(s.date, movement.date)))
        .min_by_key(|&(_, distance)| distance);

    Candidates {
        same_day_exact,
        approx_same_day,
        window_exact,
        closest,
    }
}

/// Pick the highest-priority candidate.
pub fn resolve(candidates: &Candidates) -> Resolution {
    if let Some((date, source)) = candidates.same_day_exact {
        return Resolution::ExactSameDay { date, source };
    }
    if let Some((date, difference)) = candidates.approx_same_day {
        return Resolution::ApproxSameDay { date, difference };
    }
    if let Some((date, source, distance_days)) = candidates.window_exact {
        return Resolution::ExactWindow {
            date,
            source,
            distance_days,
        };
    }
    if let Some((date, distance_days)) = candidates.closest {
        return Resolution::ClosestFallback {
            date,
            distance_days,
        };
    }
    Resolution::Unmatched
}

fn warning_reason(resolution: &Resolution, config: &AlignmentConfig) -> String {
    match resolution {
        Resolution::ClosestFallback { distance_days, .. } => format!(
            "no balance change within {:.2} in a {}-day window; nearest valuation is {} day(s) away",
            config.exact_tolerance, config.window_days, distance_days
        ),
        Resolution::Unmatched => "no valuations to match against".to_string(),
        _ => format!("matched as {}", resolution.kind()),
    }
}

pub fn align_movement(
    movement: &CashMovement,
    snapshots: &[ValuationSnapshot],
    config: &AlignmentConfig,
) -> (AlignedMovement, Option<AlignmentWarning>) {
    let resolution = resolve(&collect_candidates(movement, snapshots, config));
    let aligned = AlignedMovement {
        date: movement.date,
        amount: movement.amount,
        effective_date: resolution.date().unwrap_or(movement.date),
        match_kind: resolution.kind(),
        delta_source: resolution.source(),
    };

    let warning = aligned.match_kind.is_weak().then(|| AlignmentWarning {
        date: aligned.date,
        amount: aligned.amount,
        match_kind: aligned.match_kind,
        effective_date: aligned.effective_date,
        reason: warning_reason(&resolution, config),
    });

    (aligned, warning)
}

/// Align every movement, in input order. Never drops or merges movements.
pub fn align_movements(
    snapshots: &[ValuationSnapshot],
    movements: &[CashMovement],
    config: &AlignmentConfig,
) -> Alignment {
    let mut alignment = Alignment {
        movements: Vec::with_capacity(movements.len()),
        warnings: Vec::new(),
    };
    for movement in movements {
        let (aligned, warning) = align_movement(movement, snapshots, config);
        alignment.movements.push(aligned);
        alignment.warnings.extend(warning);
    }
    alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn snap(day: u32, net_worth: f64, cash: f64, margin: f64) -> ValuationSnapshot {
        ValuationSnapshot::new(d(day), net_worth, cash, margin)
    }

    fn align_one(snapshots: &[ValuationSnapshot], day: u32, amount: f64) -> AlignedMovement {
        let (aligned, _) = align_movement(
            &CashMovement::new(d(day), amount),
            snapshots,
            &AlignmentConfig::default(),
        );
        aligned
    }

    #[test]
    fn same_day_cash_deposit_is_exact() {
        let snaps = vec![snap(1, 1000.0, 1000.0, 0.0), snap(2, 1100.0, 1100.0, 0.0)];
        let aligned = align_one(&snaps, 2, 100.0);

        assert_eq!(aligned.match_kind, MatchKind::ExactSameDay);
        assert_eq!(aligned.effective_date, d(2));
        // Net worth and cash both moved by 100; net worth outranks cash.
        assert_eq!(aligned.delta_source, Some(DeltaSource::NetWorth));
    }

    #[test]
    fn exact_match_source_priority() {
        let deltas = PairDeltas {
            cash: 50.0,
            margin: 50.0,
            combined: 100.0,
            net_worth: 7.0,
        };
        assert_eq!(deltas.exact_match(50.0, 0.01), Some(DeltaSource::Cash));
        assert_eq!(deltas.exact_match(100.0, 0.01), Some(DeltaSource::Combined));
        assert_eq!(deltas.exact_match(7.005, 0.01), Some(DeltaSource::NetWorth));
        assert_eq!(deltas.exact_match(8.0, 0.01), None);
    }

    #[test]
    fn margin_repayment_delta_is_positive() {
        let curr = snap(1, 1000.0, 500.0, 300.0);
        let next = snap(2, 1000.0, 500.0, 100.0);
        let deltas = PairDeltas::between(&curr, &next);
        assert_eq!(deltas.margin, 200.0);
        assert_eq!(deltas.combined, 200.0);
        assert_eq!(deltas.exact_match(200.0, 0.01), Some(DeltaSource::Combined));
    }

    #[test]
    fn settlement_delay_matches_within_window() {
        let snaps = vec![
            snap(1, 1000.0, 200.0, 0.0),
            snap(4, 1012.0, 200.0, 0.0),
            snap(5, 1540.0, 700.0, 0.0),
        ];
        let aligned = align_one(&snaps, 2, 500.0);

        assert_eq!(aligned.match_kind, MatchKind::ExactWindow);
        assert_eq!(aligned.effective_date, d(5));
        // No margin change, so the combined delta equals the cash delta and wins.
        assert_eq!(aligned.delta_source, Some(DeltaSource::Combined));
        assert_eq!(aligned.date, d(2));
    }

    #[test]
    fn window_exact_keeps_nearest_date() {
        // Cash rises by 300 on both day 3 and day 6; movement on day 5.
        let snaps = vec![
            snap(2, 1000.0, 0.0, 0.0),
            snap(3, 1290.0, 300.0, 0.0),
            snap(4, 1280.0, 300.0, 0.0),
            snap(6, 1590.0, 600.0, 0.0),
        ];
        let aligned = align_one(&snaps, 5, 300.0);

        assert_eq!(aligned.match_kind, MatchKind::ExactWindow);
        assert_eq!(aligned.effective_date, d(6));
    }

    #[test]
    fn window_exact_tie_keeps_earlier_pair() {
        let snaps = vec![
            snap(3, 1000.0, 0.0, 0.0),
            snap(4, 1080.0, 100.0, 0.0),
            snap(5, 1080.0, 100.0, 0.0),
            snap(6, 1190.0, 200.0, 0.0),
        ];
        let aligned = align_one(&snaps, 5, 100.0);
        assert_eq!(aligned.effective_date, d(4));
    }

    #[test]
    fn approximate_same_day_absorbs_market_noise() {
        // 10_000 deposit on a day the market added 300 (3%).
        let snaps = vec![
            snap(1, 50_000.0, 1_000.0, 0.0),
            snap(2, 60_300.0, 1_000.0, 0.0),
        ];
        let aligned = align_one(&snaps, 2, 10_000.0);

        assert_eq!(aligned.match_kind, MatchKind::ApproxSameDay);
        assert_eq!(aligned.effective_date, d(2));
        assert_eq!(aligned.delta_source, None);
    }

    #[test]
    fn approximate_band_is_relative_to_amount() {
        // Off by 6%: outside the 5% band, falls through to closest date.
        let snaps = vec![
            snap(1, 50_000.0, 1_000.0, 0.0),
            snap(2, 60_600.0, 1_000.0, 0.0),
        ];
        let aligned = align_one(&snaps, 2, 10_000.0);
        assert_eq!(aligned.match_kind, MatchKind::ClosestFallback);
    }

    #[test]
    fn same_day_exact_beats_window_exact() {
        let snaps = vec![
            snap(1, 1000.0, 0.0, 0.0),
            snap(2, 1000.0, 100.0, 0.0),
            snap(3, 1100.0, 100.0, 0.0),
        ];
        let aligned = align_one(&snaps, 3, 100.0);
        assert_eq!(aligned.match_kind, MatchKind::ExactSameDay);
        assert_eq!(aligned.effective_date, d(3));
    }

    #[test]
    fn approx_same_day_beats_window_exact() {
        let snaps = vec![
            snap(1, 1000.0, 0.0, 0.0),
            snap(2, 1000.0, 1000.0, 0.0),
            snap(3, 2030.0, 1000.0, 0.0),
        ];
        let aligned = align_one(&snaps, 3, 1000.0);
        assert_eq!(aligned.match_kind, MatchKind::ApproxSameDay);
        assert_eq!(aligned.effective_date, d(3));
    }

    #[test]
    fn falls_back_to_closest_date_and_warns() {
        let snaps = vec![
            snap(1, 1000.0, 0.0, 0.0),
            snap(10, 1005.0, 0.0, 0.0),
            snap(20, 990.0, 0.0, 0.0),
        ];
        let movement = CashMovement::new(d(12), 250.0);
        let (aligned, warning) =
            align_movement(&movement, &snaps, &AlignmentConfig::default());

        assert_eq!(aligned.match_kind, MatchKind::ClosestFallback);
        assert_eq!(aligned.effective_date, d(10));
        let warning = warning.unwrap();
        assert_eq!(warning.match_kind, MatchKind::ClosestFallback);
        assert_eq!(warning.date, d(12));
        assert_eq!(warning.effective_date, d(10));
    }

    #[test]
    fn closest_fallback_considers_first_snapshot() {
        let snaps = vec![snap(5, 1000.0, 0.0, 0.0), snap(20, 990.0, 0.0, 0.0)];
        let aligned = align_one(&snaps, 4, 77.0);
        assert_eq!(aligned.match_kind, MatchKind::ClosestFallback);
        assert_eq!(aligned.effective_date, d(5));
    }

    #[test]
    fn closest_fallback_tie_keeps_earlier_snapshot() {
        let snaps = vec![snap(1, 1000.0, 0.0, 0.0), snap(9, 990.0, 0.0, 0.0)];
        let aligned = align_one(&snaps, 5, 77.0);
        assert_eq!(aligned.effective_date, d(1));
    }

    #[test]
    fn single_snapshot_uses_fallback() {
        let snaps = vec![snap(5, 1000.0, 1000.0, 0.0)];
        let aligned = align_one(&snaps, 5, 100.0);
        assert_eq!(aligned.match_kind, MatchKind::ClosestFallback);
        assert_eq!(aligned.effective_date, d(5));
    }

    #[test]
    fn empty_series_is_unmatched() {
        let movement = CashMovement::new(d(7), -40.0);
        let (aligned, warning) = align_movement(&movement, &[], &AlignmentConfig::default());

        assert_eq!(aligned.match_kind, MatchKind::Unmatched);
        assert_eq!(aligned.effective_date, d(7));
        assert_eq!(warning.unwrap().match_kind, MatchKind::Unmatched);
    }

    #[test]
    fn exact_same_day_wins_even_when_other_day_is_closer_numerically() {
        // Day 3 pair has net worth delta exactly 100; day 2 pair's cash delta
        // is 100.001 (also within tolerance but window-only).
        let snaps = vec![
            snap(1, 1000.0, 0.0, 0.0),
            snap(2, 1000.0, 100.001, 0.0),
            snap(3, 1100.0, 100.001, 0.0),
        ];
        let aligned = align_one(&snaps, 3, 100.0);
        assert_eq!(aligned.match_kind, MatchKind::ExactSameDay);
        assert_eq!(aligned.delta_source, Some(DeltaSource::NetWorth));
    }

    #[test]
    fn resolve_priority_order() {
        let full = Candidates {
            same_day_exact: Some((d(3), DeltaSource::Cash)),
            approx_same_day: Some((d(3), 1.0)),
            window_exact: Some((d(4), DeltaSource::NetWorth, 1)),
            closest: Some((d(3), 0)),
        };
        assert_eq!(resolve(&full).kind(), MatchKind::ExactSameDay);

        let no_exact = Candidates {
            same_day_exact: None,
            ..full.clone()
        };
        assert_eq!(resolve(&no_exact).kind(), MatchKind::ApproxSameDay);

        let window_only = Candidates {
            approx_same_day: None,
            ..no_exact.clone()
        };
        assert_eq!(
            resolve(&window_only),
            Resolution::ExactWindow {
                date: d(4),
                source: DeltaSource::NetWorth,
                distance_days: 1
            }
        );

        let closest_only = Candidates {
            window_exact: None,
            ..window_only
        };
        assert_eq!(resolve(&closest_only).kind(), MatchKind::ClosestFallback);

        assert_eq!(resolve(&Candidates::default()), Resolution::Unmatched);
    }

    #[test]
    fn custom_window_excludes_distant_pairs() {
        let snaps = vec![snap(1, 1000.0, 0.0, 0.0), snap(5, 1500.0, 500.0, 0.0)];
        let config = AlignmentConfig {
            window_days: 1,
            ..AlignmentConfig::default()
        };
        let (aligned, _) = align_movement(&CashMovement::new(d(2), 500.0), &snaps, &config);
        assert_eq!(aligned.match_kind, MatchKind::ClosestFallback);
        assert_eq!(aligned.effective_date, d(1));
    }

    #[test]
    fn align_movements_keeps_every_movement_in_order() {
        let snaps = vec![
            snap(1, 1000.0, 1000.0, 0.0),
            snap(2, 1100.0, 1100.0, 0.0),
            snap(3, 1100.0, 1100.0, 0.0),
        ];
        let moves = vec![
            CashMovement::new(d(2), 100.0),
            CashMovement::new(d(2), 100.0),
            CashMovement::new(d(30), -5.0),
        ];
        let alignment = align_movements(&snaps, &moves, &AlignmentConfig::default());

        assert_eq!(alignment.movements.len(), 3);
        assert_eq!(alignment.movements[0].match_kind, MatchKind::ExactSameDay);
        assert_eq!(alignment.movements[1].match_kind, MatchKind::ExactSameDay);
        assert_eq!(alignment.movements[2].match_kind, MatchKind::ClosestFallback);
        assert_eq!(alignment.warnings.len(), 1);
        assert_eq!(alignment.warnings[0].date, d(30));
    }

    #[test]
    fn warning_present_only_for_weak_matches() {
        let snaps = vec![
            snap(1, 1000.0, 1000.0, 0.0),
            snap(2, 1100.0, 1100.0, 0.0),
            snap(3, 1180.0, 1100.0, 0.0),
            snap(20, 1190.0, 1100.0, 0.0),
        ];
        let cases = [
            (snaps.as_slice(), 2, 100.0),
            (snaps.as_slice(), 3, 50.0),
            (&[][..], 4, 10.0),
        ];

        let mut kinds = Vec::new();
        for (series, day, amount) in cases {
            let (aligned, warning) = align_movement(
                &CashMovement::new(d(day), amount),
                series,
                &AlignmentConfig::default(),
            );
            assert_eq!(warning.is_some(), aligned.match_kind.is_weak());
            if let Some(w) = warning {
                assert_eq!(w.match_kind, aligned.match_kind);
                assert!(!w.reason.is_empty());
            }
            kinds.push(aligned.match_kind);
        }
        assert_eq!(
            kinds,
            vec![
                MatchKind::ExactSameDay,
                MatchKind::ClosestFallback,
                MatchKind::Unmatched
            ]
        );
    }

    #[test]
    fn match_kind_labels() {
        assert_eq!(MatchKind::ExactSameDay.to_string(), "exact-same-day");
        assert_eq!(MatchKind::Unmatched.as_str(), "unmatched");
        assert!(MatchKind::ClosestFallback.is_weak());
        assert!(!MatchKind::ExactWindow.is_weak());
    }
}
