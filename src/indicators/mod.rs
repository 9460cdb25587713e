//! Technical indicators over a rate sequence ordered oldest first.
//!
//! Every function here is total: when the history is too short for a full
//! window it returns a documented neutral value instead of failing, so cold
//! start series need no special casing upstream.

pub mod ema;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod volatility;

pub use ema::*;
pub use rsi::*;
pub use macd::*;
pub use bollinger::*;
pub use volatility::*;

/// Trailing `period` values, or the whole slice when it is shorter.
pub fn last_n(values: &[f64], period: usize) -> &[f64] {
    let len = values.len();
    if period >= len {
        values
    } else {
        &values[len - period..]
    }
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(mean(last_n(values, period)))
}

/// Population standard deviation of the trailing window.
pub fn stddev(values: &[f64], period: usize) -> Option<f64> {
    let mean = sma(values, period)?;
    let variance = last_n(values, period)
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;

    Some(variance.sqrt())
}

/// Trailing moving average; falls back to the latest value when the window is
/// not yet full, and to 0.0 for an empty series.
pub fn moving_average(values: &[f64], period: usize) -> f64 {
    sma(values, period)
        .or_else(|| values.last().copied())
        .unwrap_or(0.0)
}
