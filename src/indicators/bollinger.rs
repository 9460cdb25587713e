use super::{sma, stddev};

pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_MULTIPLIER: f64 = 2.0;
/// Band center, reported when the band cannot be formed.
pub const NEUTRAL_BOLLINGER_POSITION: f64 = 0.5;
/// Relative width under which a band counts as collapsed (constant window).
const DEGENERATE_WIDTH: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// %B of `price`, clamped to [0, 1]. `None` for a collapsed band.
    pub fn percent_b(&self, price: f64) -> Option<f64> {
        let width = self.width();
        if !width.is_finite() || width <= DEGENERATE_WIDTH * self.middle.abs().max(1.0) {
            return None;
        }
        let position = (price - self.lower) / width;
        position.is_finite().then(|| position.clamp(0.0, 1.0))
    }
}

pub fn bollinger_bands(rates: &[f64], period: usize, multiplier: f64) -> Option<BollingerBands> {
    let middle = sma(rates, period)?;
    let deviation = stddev(rates, period)? * multiplier;

    Some(BollingerBands {
        upper: middle + deviation,
        middle,
        lower: middle - deviation,
    })
}

/// Position of the latest rate inside the ±2σ band of the trailing `period`
/// window, in [0, 1].
pub fn bollinger_position(rates: &[f64], period: usize) -> f64 {
    let Some(price) = rates.last().copied() else {
        return NEUTRAL_BOLLINGER_POSITION;
    };

    bollinger_bands(rates, period, BOLLINGER_STD_MULTIPLIER)
        .and_then(|bands| bands.percent_b(price))
        .unwrap_or(NEUTRAL_BOLLINGER_POSITION)
}
