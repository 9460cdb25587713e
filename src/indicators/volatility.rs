use super::stddev;

/// Reported when the window is not yet full.
pub const DEFAULT_VOLATILITY: f64 = 0.01;

/// Rolling volatility: population standard deviation of the trailing
/// `period` rates.
pub fn rolling_volatility(rates: &[f64], period: usize) -> f64 {
    stddev(rates, period)
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_VOLATILITY)
}
