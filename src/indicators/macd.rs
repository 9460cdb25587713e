use super::ema;

pub const DEFAULT_MACD_FAST: usize = 12;
pub const DEFAULT_MACD_SLOW: usize = 26;

/// MACD line: `ema(fast) - ema(slow)`, or 0.0 with fewer than `slow` rates.
pub fn macd(rates: &[f64], fast: usize, slow: usize) -> f64 {
    if rates.len() < slow {
        return 0.0;
    }
    ema(rates, fast) - ema(rates, slow)
}
