use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fx_forecast::config::{ForecastConfig, DEFAULT_CONFIG_FILE};
use fx_forecast::ml::{ForecastEngine, PerformanceTracker};
use fx_forecast::types::{CurrencyPair, RatePoint, SentimentSummary};

#[derive(Parser)]
#[command(name = "fx-forecast")]
#[command(version = "0.1.0")]
#[command(about = "Currency-pair exchange-rate forecasts and model performance tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered forecast models
    Models,
    /// Forecast a currency pair from a rate history
    Forecast {
        /// JSON array of rate points
        #[arg(long)]
        history: PathBuf,
        /// Currency pair, e.g. USD/EUR
        #[arg(short, long)]
        pair: Option<String>,
        #[arg(short, long)]
        model: Option<String>,
        /// Hours ahead (1-168)
        #[arg(long)]
        horizon: Option<u32>,
        /// Aggregated news sentiment in [-1, 1]
        #[arg(long, requires = "article_count")]
        sentiment_score: Option<f64>,
        #[arg(long, requires = "sentiment_score")]
        article_count: Option<u32>,
    },
    /// Score a model against a held-out rate history
    Evaluate {
        #[arg(long)]
        history: PathBuf,
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Retrain a model on a rate history
    Retrain {
        #[arg(long)]
        history: PathBuf,
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Show performance records, for one model or all of them
    Performance {
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_history(path: &Path) -> Result<Vec<RatePoint>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    let points: Vec<RatePoint> = serde_json::from_str(&raw)
        .with_context(|| format!("History file {} is not a JSON array of rate points", path.display()))?;
    info!("Loaded {} rate points from {}", points.len(), path.display());
    Ok(points)
}

fn load_tracker(config: &ForecastConfig) -> Result<PerformanceTracker> {
    let tracker = PerformanceTracker::from_seed(config.random_seed);
    if let Some(path) = &config.performance_snapshot {
        if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            let restored = tracker.restore_json(&raw)?;
            info!("Restored {} performance records from {}", restored, path.display());
        }
    }
    Ok(tracker)
}

fn save_tracker(config: &ForecastConfig, tracker: &PerformanceTracker) -> Result<()> {
    if let Some(path) = &config.performance_snapshot {
        std::fs::write(path, tracker.to_json()?)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        info!("Saved performance snapshot to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_logging(cli.verbose, cli.json_logs)?;

    let config = ForecastConfig::load(&cli.config)?;
    if let Err(errors) = config.validate() {
        for e in &errors {
            warn!("Config: {}", e);
        }
        return Err(anyhow!("Invalid configuration: {}", errors.join(", ")));
    }

    let engine = ForecastEngine::from_seed(config.random_seed);

    match cli.command {
        Commands::Models => {
            print_json(&ForecastEngine::models())?;
        }
        Commands::Forecast {
            history,
            pair,
            model,
            horizon,
            sentiment_score,
            article_count,
        } => {
            let pair: CurrencyPair = pair.as_deref().unwrap_or(&config.default_pair).parse()?;
            let model = model.unwrap_or_else(|| config.default_model.clone());
            let horizon = horizon.unwrap_or(config.default_horizon);
            let sentiment = sentiment_score
                .zip(article_count)
                .map(|(score, count)| SentimentSummary::new(score, count));

            let series = load_history(&history)?;
            let report = engine.forecast(&pair, &model, &series, sentiment.as_ref(), horizon)?;
            print_json(&report)?;
        }
        Commands::Evaluate { history, model } => {
            let model = model.unwrap_or_else(|| config.default_model.clone());
            let series = load_history(&history)?;
            let tracker = load_tracker(&config)?;
            let result = tracker.evaluate(&engine, &model, &series);
            // a failed evaluation still records the error status
            save_tracker(&config, &tracker)?;
            print_json(&result?)?;
        }
        Commands::Retrain { history, model } => {
            let model = model.unwrap_or_else(|| config.default_model.clone());
            let series = load_history(&history)?;
            let tracker = load_tracker(&config)?;
            let report = tracker.retrain(&model, &series)?;
            save_tracker(&config, &tracker)?;
            print_json(&report)?;
        }
        Commands::Performance { model } => {
            let tracker = load_tracker(&config)?;
            match model {
                Some(model) => print_json(&tracker.get_performance(&model)?)?,
                None => print_json(&tracker.all_performance())?,
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
