use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::ml::engine::validate_horizon;
use crate::ml::ModelVariant;
use crate::types::CurrencyPair;

pub const DEFAULT_CONFIG_FILE: &str = "forecast.toml";
pub const ENV_PREFIX: &str = "FX_FORECAST";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub default_model: String,
    pub default_horizon: u32,
    pub default_pair: String,
    /// Seeds the random source for reproducible runs.
    pub random_seed: Option<u64>,
    /// Tracker state is restored from here at startup and saved after
    /// retrain/evaluate.
    pub performance_snapshot: Option<PathBuf>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_model: "ensemble".to_string(),
            default_horizon: 24,
            default_pair: "USD/EUR".to_string(),
            random_seed: None,
            performance_snapshot: None,
        }
    }
}

impl ForecastConfig {
    /// Layer `FX_FORECAST_*` environment variables over the optional TOML
    /// file at `path`, falling back to defaults for anything unset.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let config: ForecastConfig = settings
            .try_deserialize()
            .context("Invalid configuration values")?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.default_model.parse::<ModelVariant>().is_err() {
            errors.push(format!("default_model '{}' is not a registered model", self.default_model));
        }
        if let Err(e) = validate_horizon(self.default_horizon) {
            errors.push(format!("default_horizon: {}", e));
        }
        if self.default_pair.parse::<CurrencyPair>().is_err() {
            errors.push(format!("default_pair '{}' is not of the form BASE/QUOTE", self.default_pair));
        }
        if matches!(&self.performance_snapshot, Some(p) if p.as_os_str().is_empty()) {
            errors.push("performance_snapshot must not be empty when set".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}
