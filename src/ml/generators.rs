use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use super::features::FeatureVector;
use super::random::RandomSource;
use crate::error::ForecastError;

/// Registered forecasting model variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    Ensemble,
    #[serde(rename = "xgboost")]
    GradientBoosted,
    RandomForest,
    #[serde(rename = "lstm")]
    Sequence,
}

/// Catalog entry for a model variant.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub description: &'static str,
    pub base_confidence: f64,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 4] = [
        ModelVariant::Ensemble,
        ModelVariant::GradientBoosted,
        ModelVariant::RandomForest,
        ModelVariant::Sequence,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ModelVariant::Ensemble => "ensemble",
            ModelVariant::GradientBoosted => "xgboost",
            ModelVariant::RandomForest => "random_forest",
            ModelVariant::Sequence => "lstm",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelVariant::Ensemble => "Combines multiple models for best accuracy",
            ModelVariant::GradientBoosted => "Gradient boosting for high performance",
            ModelVariant::RandomForest => "Ensemble method for stability",
            ModelVariant::Sequence => "Deep learning for time series patterns",
        }
    }

    /// Confidence of the first forecast step.
    pub fn base_confidence(&self) -> f64 {
        match self {
            ModelVariant::Ensemble => 0.85,
            ModelVariant::GradientBoosted => 0.80,
            ModelVariant::RandomForest => 0.75,
            ModelVariant::Sequence => 0.70,
        }
    }

    /// Half-width of the symmetric per-step forecast noise.
    pub fn noise_amplitude(&self) -> f64 {
        match self {
            ModelVariant::Ensemble => 0.002,
            ModelVariant::GradientBoosted => 0.003,
            ModelVariant::RandomForest => 0.004,
            ModelVariant::Sequence => 0.005,
        }
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            id: self.id(),
            description: self.description(),
            base_confidence: self.base_confidence(),
        }
    }

    /// Trend contribution for `step`, including the variant's own bounded
    /// random term. Forecast noise is drawn separately by [`Self::noise`].
    /// No variant currently reads the rolling rate; the step compounds on it
    /// in the engine instead.
    pub fn trend(
        &self,
        _current_rate: f64,
        step: u32,
        features: &FeatureVector,
        rng: &mut dyn RandomSource,
    ) -> f64 {
        let step = step as f64;
        match self {
            ModelVariant::Ensemble => {
                let time_factor = 0.0001 * step;
                let seasonal = 0.001 * (2.0 * PI * step / 24.0).sin();
                let momentum = rng.uniform(-0.0005, 0.0005);
                time_factor + seasonal + momentum
            }
            ModelVariant::GradientBoosted => {
                let sentiment_impact = features.sentiment_score * 0.002;
                let volatility_impact = features.volatility_5 * rng.uniform(-0.1, 0.1);
                let time_decay = 0.0001 * step * rng.uniform(0.8, 1.2);
                sentiment_impact + volatility_impact + time_decay
            }
            ModelVariant::RandomForest => {
                let ma_trend = (features.rate_ma_5 - features.rate_ma_20) * 0.1;
                let rsi_impact = (features.rsi - 50.0) / 1000.0;
                let time_factor = 0.0001 * step * rng.uniform(0.9, 1.1);
                ma_trend + rsi_impact + time_factor
            }
            ModelVariant::Sequence => {
                let cycle = 0.001 * (2.0 * PI * step / 12.0).sin();
                let momentum = (features.rate_lag_1 - features.rate_lag_3) * 0.5;
                let jitter = rng.uniform(-0.001, 0.001);
                cycle + momentum + jitter
            }
        }
    }

    pub fn noise(&self, rng: &mut dyn RandomSource) -> f64 {
        let amplitude = self.noise_amplitude();
        rng.uniform(-amplitude, amplitude)
    }
}

impl FromStr for ModelVariant {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelVariant::ALL
            .into_iter()
            .find(|variant| variant.id() == s)
            .ok_or_else(|| ForecastError::UnknownModel(s.to_string()))
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::random::ConstantRandom;

    #[test]
    fn test_model_ids_round_trip() {
        for variant in ModelVariant::ALL {
            assert_eq!(variant.id().parse::<ModelVariant>().unwrap(), variant);
        }
        assert_eq!(
            "nonexistent_model".parse::<ModelVariant>(),
            Err(ForecastError::UnknownModel("nonexistent_model".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_model_ids() {
        assert_eq!(serde_json::to_string(&ModelVariant::GradientBoosted).unwrap(), "\"xgboost\"");
        assert_eq!(serde_json::to_string(&ModelVariant::RandomForest).unwrap(), "\"random_forest\"");
        let parsed: ModelVariant = serde_json::from_str("\"lstm\"").unwrap();
        assert_eq!(parsed, ModelVariant::Sequence);
    }

    #[test]
    fn test_base_confidences_ordered() {
        assert_eq!(ModelVariant::Ensemble.base_confidence(), 0.85);
        assert_eq!(ModelVariant::GradientBoosted.base_confidence(), 0.80);
        assert_eq!(ModelVariant::RandomForest.base_confidence(), 0.75);
        assert_eq!(ModelVariant::Sequence.base_confidence(), 0.70);
    }

    #[test]
    fn test_ensemble_trend_at_midpoint() {
        let mut rng = ConstantRandom::midpoint();
        let features = FeatureVector::cold_start();
        // step 6 is a quarter of the daily cycle: sin = 1
        let trend = ModelVariant::Ensemble.trend(1.0545, 6, &features, &mut rng);
        assert!((trend - (0.0006 + 0.001)).abs() < 1e-12);
    }

    #[test]
    fn test_forest_trend_uses_ma_spread_and_rsi() {
        let mut rng = ConstantRandom::midpoint();
        let features = FeatureVector {
            rate_ma_5: 1.10,
            rate_ma_20: 1.00,
            rsi: 70.0,
            ..FeatureVector::cold_start()
        };
        let trend = ModelVariant::RandomForest.trend(1.1, 1, &features, &mut rng);
        assert!((trend - (0.01 + 0.02 + 0.0001)).abs() < 1e-9);
    }

    #[test]
    fn test_gradient_trend_uses_sentiment() {
        let mut rng = ConstantRandom::midpoint();
        let features = FeatureVector {
            sentiment_score: 0.5,
            ..FeatureVector::cold_start()
        };
        let trend = ModelVariant::GradientBoosted.trend(1.0, 2, &features, &mut rng);
        assert!((trend - (0.001 + 0.0002)).abs() < 1e-9);
    }

    #[test]
    fn test_sequence_trend_uses_short_momentum() {
        let mut rng = ConstantRandom::midpoint();
        let features = FeatureVector {
            rate_lag_1: 1.06,
            rate_lag_3: 1.05,
            ..FeatureVector::cold_start()
        };
        // step 3 is a quarter of the 12-step cycle
        let trend = ModelVariant::Sequence.trend(1.06, 3, &features, &mut rng);
        assert!((trend - (0.001 + 0.005)).abs() < 1e-9);
    }

    /// Deterministic part of the trend plus the lowest and highest value its
    /// random terms can add at `step`.
    fn trend_envelope(variant: ModelVariant, step: u32, f: &FeatureVector) -> (f64, f64) {
        let i = step as f64;
        match variant {
            ModelVariant::Ensemble => {
                let base = 0.0001 * i + 0.001 * (2.0 * PI * i / 24.0).sin();
                (base - 0.0005, base + 0.0005)
            }
            ModelVariant::GradientBoosted => {
                let base = 0.002 * f.sentiment_score;
                let swing = f.volatility_5.abs() * 0.1;
                (base - swing + 0.0001 * i * 0.8, base + swing + 0.0001 * i * 1.2)
            }
            ModelVariant::RandomForest => {
                let base = 0.1 * (f.rate_ma_5 - f.rate_ma_20) + (f.rsi - 50.0) / 1000.0;
                (base + 0.0001 * i * 0.9, base + 0.0001 * i * 1.1)
            }
            ModelVariant::Sequence => {
                let base = 0.001 * (2.0 * PI * i / 12.0).sin() + 0.5 * (f.rate_lag_1 - f.rate_lag_3);
                (base - 0.001, base + 0.001)
            }
        }
    }

    #[test]
    fn test_trend_random_terms_stay_in_variant_ranges() {
        let features = FeatureVector {
            sentiment_score: 0.3,
            volatility_5: 0.02,
            rate_ma_5: 1.06,
            rate_ma_20: 1.05,
            rsi: 62.0,
            rate_lag_1: 1.061,
            rate_lag_3: 1.058,
            ..FeatureVector::cold_start()
        };
        let tolerance = 1e-12;

        for variant in ModelVariant::ALL {
            for step in [1, 2, 6, 12, 24, 100, 168] {
                let (low, high) = trend_envelope(variant, step, &features);

                let at_low = variant.trend(0.0, step, &features, &mut ConstantRandom::new(0.0));
                let at_high = variant.trend(0.0, step, &features, &mut ConstantRandom::new(1.0));
                assert!((at_low - low).abs() < tolerance, "{} step {}: {} != {}", variant, step, at_low, low);
                assert!((at_high - high).abs() < tolerance, "{} step {}: {} != {}", variant, step, at_high, high);

                let mut rng = crate::ml::random::StdRandom::seeded(step as u64);
                for _ in 0..50 {
                    let trend = variant.trend(0.0, step, &features, &mut rng);
                    assert!(
                        trend >= low - tolerance && trend <= high + tolerance,
                        "{} step {}: {} outside [{}, {}]",
                        variant,
                        step,
                        trend,
                        low,
                        high
                    );
                }
            }
        }
    }

    #[test]
    fn test_noise_within_variant_range() {
        let mut rng = crate::ml::random::StdRandom::seeded(3);
        for variant in ModelVariant::ALL {
            let amplitude = variant.noise_amplitude();
            for _ in 0..200 {
                let noise = variant.noise(&mut rng);
                assert!(noise >= -amplitude && noise <= amplitude);
            }
        }
    }
}
