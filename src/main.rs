//! `flight-delay` command line.
//!
//! - `serve` starts the prediction API.
//! - `train` fits a classifier on a historical CSV and saves it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use flight_delay::api::{build_router, AppState, ReferenceValues};
use flight_delay::config::{AppConfig, CONFIG_ENV};
use flight_delay::dataset::{load_flight_records, train_test_split};
use flight_delay::{tracking, ClassificationReport, DelayClassifier, FeatureBuilder, Label};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "flight-delay",
    version,
    about = "Flight delay classifier and prediction service"
)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve predictions over HTTP.
    Serve,
    /// Fit a classifier on historical flights and save it.
    Train {
        /// Historical flight CSV.
        #[arg(long)]
        data: PathBuf,
        /// Where to write the fitted model.
        #[arg(long)]
        output: PathBuf,
        /// Share of rows held out for evaluation.
        #[arg(long, default_value_t = 0.33)]
        test_size: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Train {
            data,
            output,
            test_size,
            seed,
        } => train(&config, &data, &output, test_size, seed),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let references = ReferenceValues::load(&config.reference_data).with_context(|| {
        format!(
            "failed to load reference values from {}",
            config.reference_data.display()
        )
    })?;

    let classifier = match &config.model_path {
        Some(path) if path.exists() => DelayClassifier::load_from_file(path)
            .with_context(|| format!("failed to load model {}", path.display()))?,
        Some(path) => {
            warn!(path = %path.display(), "model file not found, serving untrained classifier");
            DelayClassifier::new()
        }
        None => {
            warn!("no model configured, serving untrained classifier");
            DelayClassifier::new()
        }
    };

    let state = Arc::new(AppState::new(Arc::new(classifier), references));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(listen_addr = %config.listen_addr, "prediction service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

fn train(
    config: &AppConfig,
    data: &Path,
    output: &Path,
    test_size: f64,
    seed: u64,
) -> anyhow::Result<()> {
    let records = load_flight_records(data)
        .with_context(|| format!("failed to read {}", data.display()))?;
    let (features, labels) = FeatureBuilder::new().preprocess(&records, true)?;
    let labels = labels.context("labels were not computed")?;

    let split = train_test_split(labels.len(), test_size, seed);
    let pick = |idx: &[usize]| -> Vec<Label> { idx.iter().map(|&i| labels[i]).collect() };
    let (x_train, y_train) = (features.select_rows(&split.train), pick(&split.train));
    let (x_test, y_test) = (features.select_rows(&split.test), pick(&split.test));
    info!(train = y_train.len(), test = y_test.len(), seed, "split dataset");

    let mut classifier = DelayClassifier::new()
        .with_options(config.training.clone())
        .with_tracker(tracking::from_config(&config.tracking));
    classifier.fit(&x_train, &y_train)?;

    if y_test.is_empty() {
        warn!("empty test split, skipping evaluation");
    } else {
        let report = ClassificationReport::compute(&y_test, &classifier.predict(&x_test))?;
        info!(
            accuracy = report.accuracy,
            recall_delayed = report.classes[1].recall,
            f1_delayed = report.classes[1].f1,
            "evaluation on held-out flights"
        );
        println!("{report}");
    }

    classifier
        .save_to_file(output)
        .with_context(|| format!("failed to save model to {}", output.display()))?;
    info!(path = %output.display(), "model saved");
    Ok(())
}
