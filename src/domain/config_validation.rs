//! Configuration validation.
//!
//! Validates every analysis setting before a run. All keys are optional;
//! a present key must parse and fall in range.

use crate::domain::error::AnalyticsError;
use crate::ports::config_port::ConfigPort;

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    validate_window_days(config)?;
    validate_exact_tolerance(config)?;
    validate_approx_tolerance(config)?;
    validate_sharpe_window(config)?;
    validate_dates(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> AnalyticsError {
    AnalyticsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

// A present value must parse; `get_int`/`get_double` would silently fall
// back to the default.
fn require_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), AnalyticsError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<i64>().is_err() => {
            Err(invalid(section, key, &format!("{key} must be a whole number")))
        }
        _ => Ok(()),
    }
}

fn require_float(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), AnalyticsError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<f64>().is_err() => {
            Err(invalid(section, key, &format!("{key} must be a number")))
        }
        _ => Ok(()),
    }
}

fn validate_window_days(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    require_int(config, "alignment", "window_days")?;
    let value = config.get_int("alignment", "window_days", 0);
    if value < 0 {
        return Err(invalid(
            "alignment",
            "window_days",
            "window_days must be non-negative",
        ));
    }
    Ok(())
}

fn validate_exact_tolerance(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    require_float(config, "alignment", "exact_tolerance")?;
    let value = config.get_double("alignment", "exact_tolerance", 0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "alignment",
            "exact_tolerance",
            "exact_tolerance must be a non-negative amount",
        ));
    }
    Ok(())
}

fn validate_approx_tolerance(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    require_float(config, "alignment", "approx_tolerance_pct")?;
    let value = config.get_double("alignment", "approx_tolerance_pct", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "alignment",
            "approx_tolerance_pct",
            "approx_tolerance_pct must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_sharpe_window(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    require_int(config, "metrics", "sharpe_window")?;
    let value = config.get_int("metrics", "sharpe_window", 1);
    if value < 1 {
        return Err(invalid(
            "metrics",
            "sharpe_window",
            "sharpe_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let start = config.get_date("analysis", "start_date")?;
    let end = config.get_date("analysis", "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "analysis",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}
