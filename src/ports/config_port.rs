//! Configuration access port trait.

use chrono::NaiveDate;

use crate::domain::error::AnalyticsError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Optional `YYYY-MM-DD` date. Blank counts as absent.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, AnalyticsError> {
        match self.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| AnalyticsError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("invalid {} format, expected YYYY-MM-DD", key),
                }),
            _ => Ok(None),
        }
    }
}
