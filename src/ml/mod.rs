pub mod engine;
pub mod features;
pub mod generators;
pub mod random;
pub mod report;
pub mod tracker;

pub use engine::{ForecastEngine, MAX_HORIZON};
pub use features::{build_features, FeatureVector};
pub use generators::{ModelInfo, ModelVariant};
pub use random::{ConstantRandom, RandomSource, StdRandom};
pub use report::{ForecastPoint, ForecastReport, ForecastSummary, TrendDirection};
pub use tracker::{
    Evaluation, EvaluationReport, ModelPerformance, ModelStatus, PerformanceTracker, RetrainReport,
    RetrainStatus,
};
