//! Core domain types and logic.

pub mod valuation;
pub mod alignment;
pub mod returns;
pub mod metrics;
pub mod analysis;
pub mod config_validation;
pub mod error;
