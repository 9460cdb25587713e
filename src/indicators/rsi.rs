use super::last_n;

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const NEUTRAL_RSI: f64 = 50.0;

/// Relative strength index over the most recent `period` deltas.
///
/// Average gain and loss are simple means over the window. Returns
/// [`NEUTRAL_RSI`] when fewer than `period + 1` rates are available or the
/// window shows no movement at all; an all-gain window reads 100.
pub fn rsi(rates: &[f64], period: usize) -> f64 {
    if period == 0 || rates.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let window = last_n(rates, period + 1);
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(gains, losses), change| {
            if change > 0.0 {
                (gains + change, losses)
            } else {
                (gains, losses - change)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    let value = if avg_loss == 0.0 && avg_gain == 0.0 {
        NEUTRAL_RSI
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    };

    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        NEUTRAL_RSI
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_insufficient_history_is_neutral() {
        let rates: Vec<f64> = (0..14).map(|i| 1.0 + i as f64 * 0.01).collect();
        assert_eq!(rsi(&rates, 14), NEUTRAL_RSI);
        assert_eq!(rsi(&[], 14), NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_all_gains() {
        let rates: Vec<f64> = (0..20).map(|i| 1.0 + i as f64 * 0.01).collect();
        assert_eq!(rsi(&rates, 14), 100.0);
    }

    #[test]
    fn test_rsi_all_losses() {
        let rates: Vec<f64> = (0..20).map(|i| 2.0 - i as f64 * 0.01).collect();
        assert_eq!(rsi(&rates, 14), 0.0);
    }

    #[test]
    fn test_rsi_balanced_moves() {
        let rates: Vec<f64> = (0..15)
            .map(|i| if i % 2 == 0 { 1.0 } else { 1.1 })
            .collect();
        assert!((rsi(&rates, 14) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_constant_series_is_neutral() {
        assert_eq!(rsi(&vec![1.05; 30], 14), NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_bounded_on_varied_series() {
        for seed in 0..50u32 {
            let rates: Vec<f64> = (0..(seed as usize + 1))
                .map(|i| 1.0 + ((i as f64 * 1.7 + seed as f64).sin() * 0.05))
                .collect();
            let value = rsi(&rates, 14);
            assert!((0.0..=100.0).contains(&value), "rsi {} out of range", value);
        }
    }
}
