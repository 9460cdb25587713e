//! Hourly exchange-rate forecasting for currency pairs.
//!
//! [`ml::build_features`] turns a rate history into a fixed feature vector,
//! [`ml::ForecastEngine`] runs one of the registered model variants over it,
//! and [`ml::PerformanceTracker`] keeps per-model accuracy records.

pub mod config;
pub mod error;
pub mod indicators;
pub mod ml;
pub mod types;

pub use error::{ForecastError, Result};
