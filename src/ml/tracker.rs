use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

use super::engine::ForecastEngine;
use super::features::{build_features, MIN_HISTORY};
use super::generators::ModelVariant;
use super::random::{RandomSource, StdRandom};
use super::report::round_to;
use crate::error::{ForecastError, Result};
use crate::types::{RatePoint, RateSeries};

const MIN_ACCURACY: f64 = 0.70;
const MAX_ACCURACY: f64 = 0.95;
const DEGRADED_DIRECTIONAL_ACCURACY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Active,
    Degraded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub model_id: ModelVariant,
    pub accuracy: f64,
    pub mse: f64,
    pub mae: f64,
    pub directional_accuracy: f64,
    pub last_trained: DateTime<Utc>,
    pub training_samples: usize,
    pub status: ModelStatus,
}

impl ModelPerformance {
    fn initial(model_id: ModelVariant, now: DateTime<Utc>) -> Self {
        let (accuracy, mse, mae, directional_accuracy, hours_since_training) = match model_id {
            ModelVariant::Ensemble => (0.847, 0.000123, 0.0089, 0.723, 6),
            ModelVariant::GradientBoosted => (0.821, 0.000156, 0.0102, 0.698, 6),
            ModelVariant::RandomForest => (0.798, 0.000189, 0.0115, 0.675, 6),
            ModelVariant::Sequence => (0.785, 0.000201, 0.0128, 0.662, 8),
        };

        Self {
            model_id,
            accuracy,
            mse,
            mae,
            directional_accuracy,
            last_trained: now - Duration::hours(hours_since_training),
            training_samples: 50_000,
            status: ModelStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrainStatus {
    Completed,
    /// No training data; nothing was changed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainReport {
    pub status: RetrainStatus,
    pub model: ModelVariant,
    pub new_accuracy: f64,
    pub training_samples: usize,
    /// Seconds.
    pub training_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model: ModelVariant,
    pub mse: f64,
    pub mae: f64,
    pub rmse: f64,
    pub directional_accuracy: f64,
    pub test_samples: usize,
}

/// Outcome of [`PerformanceTracker::evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Evaluation {
    Computed(EvaluationReport),
    /// Too little test data to score; the stored record, untouched.
    Stored(ModelPerformance),
}

/// Per-model accuracy and error metrics.
///
/// Each record sits behind its own lock: reads clone a consistent snapshot,
/// and retrain/evaluate hold the write lock for the whole update so writers
/// on the same model never interleave.
pub struct PerformanceTracker {
    records: HashMap<ModelVariant, RwLock<ModelPerformance>>,
    rng: Mutex<Box<dyn RandomSource + Send>>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::with_random(StdRandom::from_entropy())
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        Self::with_random(StdRandom::from_seed_option(seed))
    }

    pub fn with_random<R: RandomSource + Send + 'static>(rng: R) -> Self {
        let now = Utc::now();
        let records = ModelVariant::ALL
            .into_iter()
            .map(|variant| (variant, RwLock::new(ModelPerformance::initial(variant, now))))
            .collect();

        Self {
            records,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    fn record(&self, model_id: &str) -> Result<(ModelVariant, &RwLock<ModelPerformance>)> {
        let variant: ModelVariant = model_id.parse()?;
        let record = self
            .records
            .get(&variant)
            .ok_or_else(|| ForecastError::UnknownModel(model_id.to_string()))?;
        Ok((variant, record))
    }

    fn draw(&self, low: f64, high: f64) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .uniform(low, high)
    }

    pub fn get_performance(&self, model_id: &str) -> Result<ModelPerformance> {
        let (_, record) = self.record(model_id)?;
        let snapshot = record.read().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(snapshot)
    }

    /// Snapshot of every model's record, in catalog order.
    pub fn all_performance(&self) -> Vec<ModelPerformance> {
        ModelVariant::ALL
            .iter()
            .filter_map(|variant| self.records.get(variant))
            .map(|record| record.read().unwrap_or_else(PoisonError::into_inner).clone())
            .collect()
    }

    /// Simulated retrain: refreshes the training metadata and nudges accuracy
    /// by a bounded random delta.
    pub fn retrain(&self, model_id: &str, training_data: &[RatePoint]) -> Result<RetrainReport> {
        let (variant, record) = self.record(model_id)?;

        if training_data.is_empty() {
            let current = record.read().unwrap_or_else(PoisonError::into_inner);
            debug!("Retrain of {} skipped: no training data", variant);
            return Ok(RetrainReport {
                status: RetrainStatus::Skipped,
                model: variant,
                new_accuracy: current.accuracy,
                training_samples: 0,
                training_time: 0.0,
            });
        }

        let mut current = record.write().unwrap_or_else(PoisonError::into_inner);
        let improvement = self.draw(-0.02, 0.05);
        let new_accuracy = round_to((current.accuracy + improvement).clamp(MIN_ACCURACY, MAX_ACCURACY), 3);
        let training_time = self.draw(300.0, 900.0);

        current.accuracy = new_accuracy;
        current.last_trained = Utc::now();
        current.training_samples = training_data.len();
        current.status = ModelStatus::Active;

        info!(
            "Retrained {}: {} samples, accuracy {:.1}%",
            variant,
            training_data.len(),
            new_accuracy * 100.0
        );

        Ok(RetrainReport {
            status: RetrainStatus::Completed,
            model: variant,
            new_accuracy,
            training_samples: training_data.len(),
            training_time,
        })
    }

    /// Walk the test series one hour at a time, forecasting each next rate
    /// from the history before it, and score the forecasts.
    ///
    /// Only points preceded by at least [`MIN_HISTORY`] observations are
    /// scored; shorter prefixes would forecast from the cold-start vector
    /// rather than the pair's own rates. A series of `MIN_HISTORY` points or
    /// fewer (including an empty one) therefore has nothing to score and
    /// returns the stored record unchanged.
    pub fn evaluate(
        &self,
        engine: &ForecastEngine,
        model_id: &str,
        test_series: &[RatePoint],
    ) -> Result<Evaluation> {
        let (variant, record) = self.record(model_id)?;

        if test_series.len() <= MIN_HISTORY {
            debug!(
                "Evaluation of {} skipped: {} points, need more than {}",
                variant,
                test_series.len(),
                MIN_HISTORY
            );
            let stored = record.read().unwrap_or_else(PoisonError::into_inner).clone();
            return Ok(Evaluation::Stored(stored));
        }

        let series = RateSeries::from_points(test_series);
        let points = series.points();
        let mut predictions = Vec::with_capacity(points.len() - MIN_HISTORY);
        let mut actuals = Vec::with_capacity(points.len() - MIN_HISTORY);

        for k in MIN_HISTORY..points.len() {
            let features = build_features(&points[..k], None);
            let step = match engine.predict_variant(variant, &features, 1) {
                Ok(steps) => steps.into_iter().next(),
                Err(e) => {
                    warn!("Evaluation of {} failed at point {}: {}", variant, k, e);
                    record.write().unwrap_or_else(PoisonError::into_inner).status = ModelStatus::Error;
                    return Err(e);
                }
            };
            if let Some(step) = step {
                predictions.push(step.predicted_rate);
                actuals.push(points[k].rate);
            }
        }

        let report = score(variant, &predictions, &actuals, test_series.len());

        let mut current = record.write().unwrap_or_else(PoisonError::into_inner);
        current.mse = report.mse;
        current.mae = report.mae;
        current.directional_accuracy = report.directional_accuracy;
        let status = if report.directional_accuracy < DEGRADED_DIRECTIONAL_ACCURACY {
            ModelStatus::Degraded
        } else {
            ModelStatus::Active
        };
        if status != current.status {
            info!("{} status {:?} -> {:?}", variant, current.status, status);
        }
        current.status = status;

        info!(
            "Evaluated {}: mse={:.6}, mae={:.4}, directional={:.1}%",
            variant,
            report.mse,
            report.mae,
            report.directional_accuracy * 100.0
        );

        Ok(Evaluation::Computed(report))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.all_performance())?)
    }

    /// Overwrite records from a snapshot produced by [`Self::to_json`].
    /// Returns the number of records restored.
    pub fn restore_json(&self, json: &str) -> Result<usize> {
        let snapshot: Vec<ModelPerformance> = serde_json::from_str(json)?;
        let mut restored = 0;
        for performance in snapshot {
            if let Some(record) = self.records.get(&performance.model_id) {
                *record.write().unwrap_or_else(PoisonError::into_inner) = performance;
                restored += 1;
            }
        }
        Ok(restored)
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics rounded for storage and transport: errors to 6 dp (mae to 4),
/// directional accuracy to 3.
fn score(model: ModelVariant, predictions: &[f64], actuals: &[f64], test_samples: usize) -> EvaluationReport {
    let n = predictions.len().max(1) as f64;
    let (squared, absolute) = predictions
        .iter()
        .zip(actuals)
        .fold((0.0, 0.0), |(sq, abs), (p, a)| {
            let error = p - a;
            (sq + error * error, abs + error.abs())
        });
    let mse = squared / n;

    let pairs = predictions.len().saturating_sub(1);
    let correct = (1..predictions.len())
        .filter(|&i| (predictions[i] > predictions[i - 1]) == (actuals[i] > actuals[i - 1]))
        .count();

    EvaluationReport {
        model,
        mse: round_to(mse, 6),
        mae: round_to(absolute / n, 4),
        rmse: round_to(mse.sqrt(), 6),
        directional_accuracy: round_to(correct as f64 / pairs.max(1) as f64, 3),
        test_samples,
    }
}
