//! One-time model training for somnoscreen.
//!
//! Loads the sleep health & lifestyle CSV, performs the feature engineering
//! (blood-pressure split, missing-label fill), fits the preprocessing +
//! classifier pipeline, and writes the artifact the serving binary loads.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin train_model -- [<dataset.csv>] [<artifact.json>]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use somnoscreen::adapters::{Dataset, PipelineTrainer};

const DEFAULT_DATASET: &str = "data/Sleep_health_and_lifestyle_dataset.csv";
const DEFAULT_ARTIFACT: &str = "models/sleep_pipeline.json";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let dataset_path = args.next().map_or_else(|| PathBuf::from(DEFAULT_DATASET), PathBuf::from);
    let artifact_path = args.next().map_or_else(|| PathBuf::from(DEFAULT_ARTIFACT), PathBuf::from);

    let dataset = Dataset::from_csv_path(&dataset_path)
        .with_context(|| format!("loading dataset {}", dataset_path.display()))?;
    tracing::info!(rows = dataset.len(), labels = ?dataset.labels(), "Dataset loaded");

    let artifact = PipelineTrainer::default()
        .fit(&dataset)
        .context("fitting pipeline")?;

    if let Some(parent) = artifact_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    artifact
        .save(&artifact_path)
        .with_context(|| format!("writing artifact {}", artifact_path.display()))?;

    println!(
        "Trained on {} rows ({} classes: {}); artifact written to {}",
        dataset.len(),
        artifact.categories.len(),
        artifact.categories.join(", "),
        artifact_path.display()
    );
    Ok(())
}
