//! Core domain types and logic.

pub mod price_table;
pub mod weights;
pub mod metrics;
pub mod alert;
pub mod alert_eval;
pub mod universe;
pub mod monitor;
pub mod config_validation;
pub mod error;
