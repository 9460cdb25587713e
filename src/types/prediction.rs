use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    pub fn between(previous: f64, next: f64) -> Self {
        if next > previous {
            Trend::Up
        } else {
            Trend::Down
        }
    }
}

/// One hour-ahead forecast step.
///
/// `lower_bound <= predicted_rate <= upper_bound` holds for every step the
/// engine produces, and `confidence` is in [0.5, 1.0].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionStep {
    pub horizon_offset: u32,
    pub predicted_rate: f64,
    pub confidence: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub trend: Trend,
    /// Half-width of the uncertainty band.
    pub volatility: f64,
}

impl PredictionStep {
    pub fn band_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}
