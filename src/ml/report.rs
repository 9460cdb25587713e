use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::generators::ModelVariant;
use crate::types::{CurrencyPair, PredictionStep, Trend};

/// Round half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
}

impl TrendDirection {
    pub fn as_str(&self) -> &str {
        match self {
            TrendDirection::Bullish => "bullish",
            TrendDirection::Bearish => "bearish",
        }
    }
}

/// A forecast step as the API and WebSocket layers serialize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub predicted: f64,
    pub confidence: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub trend: Trend,
    pub volatility: f64,
}

impl ForecastPoint {
    fn from_step(step: &PredictionStep, as_of: DateTime<Utc>) -> Self {
        Self {
            timestamp: as_of + Duration::hours(step.horizon_offset as i64),
            predicted: round_to(step.predicted_rate, 4),
            confidence: round_to(step.confidence, 3),
            lower_bound: round_to(step.lower_bound, 4),
            upper_bound: round_to(step.upper_bound, 4),
            trend: step.trend,
            volatility: round_to(step.volatility, 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub predicted_change: f64,
    pub predicted_change_percent: f64,
    pub average_confidence: f64,
    pub trend_direction: TrendDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub pair: CurrencyPair,
    pub model: ModelVariant,
    pub horizon: u32,
    pub generated_at: DateTime<Utc>,
    pub predictions: Vec<ForecastPoint>,
    pub summary: ForecastSummary,
}

impl ForecastReport {
    /// `anchor_rate` is the last observed rate the forecast started from.
    pub fn build(
        pair: CurrencyPair,
        model: ModelVariant,
        steps: &[PredictionStep],
        anchor_rate: f64,
        as_of: DateTime<Utc>,
    ) -> Self {
        let predictions: Vec<ForecastPoint> = steps
            .iter()
            .map(|step| ForecastPoint::from_step(step, as_of))
            .collect();

        let final_rate = steps.last().map(|s| s.predicted_rate).unwrap_or(anchor_rate);
        let change = final_rate - anchor_rate;
        let change_percent = if anchor_rate != 0.0 {
            change / anchor_rate * 100.0
        } else {
            0.0
        };
        let average_confidence = if steps.is_empty() {
            0.0
        } else {
            steps.iter().map(|s| s.confidence).sum::<f64>() / steps.len() as f64
        };

        Self {
            pair,
            model,
            horizon: steps.len() as u32,
            generated_at: Utc::now(),
            predictions,
            summary: ForecastSummary {
                predicted_change: round_to(change, 4),
                predicted_change_percent: round_to(change_percent, 3),
                average_confidence: round_to(average_confidence, 3),
                trend_direction: if final_rate > anchor_rate {
                    TrendDirection::Bullish
                } else {
                    TrendDirection::Bearish
                },
            },
        }
    }
}
