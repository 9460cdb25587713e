use chrono::Utc;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use super::features::{build_features, FeatureVector};
use super::generators::{ModelInfo, ModelVariant};
use super::random::{RandomSource, StdRandom};
use super::report::ForecastReport;
use crate::error::{ForecastError, Result};
use crate::types::{CurrencyPair, PredictionStep, RatePoint, SentimentSummary, Trend};

/// One week of hourly steps.
pub const MAX_HORIZON: u32 = 168;
pub const MIN_CONFIDENCE: f64 = 0.5;
/// Share of the base confidence lost by the final step.
const CONFIDENCE_DECAY: f64 = 0.3;
const BASE_UNCERTAINTY: f64 = 0.005;

pub fn validate_horizon(horizon: u32) -> Result<()> {
    if horizon == 0 || horizon > MAX_HORIZON {
        return Err(ForecastError::InvalidHorizon {
            horizon,
            max: MAX_HORIZON,
        });
    }
    Ok(())
}

/// Linear decay from `base` at step 1 towards 70% of `base`, never below
/// [`MIN_CONFIDENCE`].
pub fn step_confidence(base: f64, step: u32, horizon: u32) -> f64 {
    let depth = step.saturating_sub(1) as f64 / horizon as f64;
    (base * (1.0 - depth * CONFIDENCE_DECAY)).clamp(MIN_CONFIDENCE, 1.0)
}

/// Half-width of the uncertainty band, widening with horizon depth.
pub fn step_uncertainty(step: u32, horizon: u32) -> f64 {
    BASE_UNCERTAINTY * (1.0 + step as f64 / horizon as f64)
}

/// Multi-step forecast engine.
///
/// Stateless apart from its random source, which is locked per call so one
/// engine can serve concurrent callers.
pub struct ForecastEngine {
    rng: Mutex<Box<dyn RandomSource + Send>>,
}

impl ForecastEngine {
    pub fn new() -> Self {
        Self::with_random(StdRandom::from_entropy())
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        Self::with_random(StdRandom::from_seed_option(seed))
    }

    pub fn with_random<R: RandomSource + Send + 'static>(rng: R) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    pub fn models() -> Vec<ModelInfo> {
        ModelVariant::ALL.iter().map(|v| v.info()).collect()
    }

    /// Forecast `horizon` hourly steps with the model registered as `model_id`.
    pub fn predict(
        &self,
        model_id: &str,
        features: &FeatureVector,
        horizon: u32,
    ) -> Result<Vec<PredictionStep>> {
        let variant: ModelVariant = model_id.parse()?;
        self.predict_variant(variant, features, horizon)
    }

    /// Each step predicts relative to the previous step's output, so trends
    /// compound across the horizon starting from `features.rate_lag_1`.
    pub fn predict_variant(
        &self,
        variant: ModelVariant,
        features: &FeatureVector,
        horizon: u32,
    ) -> Result<Vec<PredictionStep>> {
        validate_horizon(horizon)?;

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut steps = Vec::with_capacity(horizon as usize);
        let mut current_rate = features.rate_lag_1;

        for step in 1..=horizon {
            let trend = variant.trend(current_rate, step, features, &mut **rng);
            let noise = variant.noise(&mut **rng);
            let predicted_rate = current_rate + trend + noise;

            if !predicted_rate.is_finite() {
                return Err(ForecastError::GenerationError {
                    model: variant.id().to_string(),
                    step,
                    reason: match features.first_non_finite() {
                        Some(name) => format!("non-finite feature '{}'", name),
                        None => format!("non-finite prediction (trend={}, noise={})", trend, noise),
                    },
                });
            }

            let uncertainty = step_uncertainty(step, horizon);
            steps.push(PredictionStep {
                horizon_offset: step,
                predicted_rate,
                confidence: step_confidence(variant.base_confidence(), step, horizon),
                lower_bound: predicted_rate - uncertainty,
                upper_bound: predicted_rate + uncertainty,
                trend: Trend::between(current_rate, predicted_rate),
                volatility: uncertainty,
            });

            current_rate = predicted_rate;
        }

        debug!(
            "{} forecast: {} steps from {:.5} to {:.5}",
            variant,
            horizon,
            features.rate_lag_1,
            current_rate
        );

        Ok(steps)
    }

    /// Build features from `series`, forecast, and shape the result for
    /// transport. Targets are stamped hourly after the last observation.
    pub fn forecast(
        &self,
        pair: &CurrencyPair,
        model_id: &str,
        series: &[RatePoint],
        sentiment: Option<&SentimentSummary>,
        horizon: u32,
    ) -> Result<ForecastReport> {
        let variant: ModelVariant = model_id.parse()?;
        let features = build_features(series, sentiment);
        let steps = self.predict_variant(variant, &features, horizon)?;

        let as_of = series
            .iter()
            .map(|p| p.timestamp)
            .max()
            .unwrap_or_else(Utc::now);

        let report = ForecastReport::build(pair.clone(), variant, &steps, features.rate_lag_1, as_of);
        info!(
            "Forecast {} with {}: {} steps, change {:+.4} ({})",
            pair,
            variant,
            horizon,
            report.summary.predicted_change,
            report.summary.trend_direction.as_str()
        );

        Ok(report)
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new()
    }
}
