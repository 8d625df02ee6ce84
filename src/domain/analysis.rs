//! End-to-end analysis run.
//!
//! slice to window → align movements → return engine → derived metrics.
//! Each run is a full recomputation from its inputs; nothing is cached
//! between runs.

use serde::Serialize;

use super::alignment::{align_movements, AlignedMovement, AlignmentConfig, AlignmentWarning};
use super::metrics::rolling_sharpe::DEFAULT_SHARPE_WINDOW;
use super::metrics::DerivedMetrics;
use super::returns::{compute_period_stats, PeriodStats};
use super::valuation::{CashMovement, DateWindow, ValuationSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub alignment: AlignmentConfig,
    pub sharpe_window: usize,
    pub window: DateWindow,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alignment: AlignmentConfig::default(),
            sharpe_window: DEFAULT_SHARPE_WINDOW,
            window: DateWindow::all(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub window: DateWindow,
    pub stats: PeriodStats,
    pub movements: Vec<AlignedMovement>,
    pub warnings: Vec<AlignmentWarning>,
    pub metrics: DerivedMetrics,
}

/// Run the whole pipeline over the part of the input inside
/// `config.window`.
///
/// `valuations` must be strictly increasing by date.
pub fn run_analysis(
    valuations: &[ValuationSnapshot],
    movements: &[CashMovement],
    config: &AnalysisConfig,
) -> Analysis {
    let valuations = config.window.slice_valuations(valuations);
    let movements = config.window.slice_movements(movements);
    analyze_in_window(&valuations, &movements, config)
}

/// Same as [`run_analysis`] for input that already lies inside
/// `config.window`, such as rows returned by a `DataPort`.
pub fn analyze_in_window(
    valuations: &[ValuationSnapshot],
    movements: &[CashMovement],
    config: &AnalysisConfig,
) -> Analysis {
    let alignment = align_movements(valuations, movements, &config.alignment);
    let stats = compute_period_stats(valuations, &alignment.movements);
    let metrics = DerivedMetrics::compute(&stats.records, config.sharpe_window);

    Analysis {
        window: config.window,
        stats,
        movements: alignment.movements,
        warnings: alignment.warnings,
        metrics,
    }
}
