//! Data access port trait.
//!
//! Implementations are the authority on the valuation series invariant:
//! sorted by strictly increasing date, one snapshot per date. Both fetches
//! return only rows inside `window`.

use crate::domain::error::AnalyticsError;
use crate::domain::valuation::{CashMovement, DateWindow, ValuationSnapshot};

pub trait DataPort {
    fn fetch_valuations(&self, window: &DateWindow)
        -> Result<Vec<ValuationSnapshot>, AnalyticsError>;

    fn fetch_movements(&self, window: &DateWindow) -> Result<Vec<CashMovement>, AnalyticsError>;
}
