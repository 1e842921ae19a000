//! Somnoscreen serving entry point.
//!
//! Loads the trained pipeline artifact once (fatal if absent or corrupt),
//! then reads one JSON attribute record per stdin line and prints a
//! human-readable verdict per record. Request-level failures reject the
//! single record with a clear message and never terminate the loop.
//!
//! # Configuration
//!
//! - `SOMNOSCREEN_MODEL` — artifact path (default `models/sleep_pipeline.json`;
//!   a positional argument overrides both)
//! - `SOMNOSCREEN_THRESHOLD` — no-disorder cutoff in (0, 1] (default 0.80)
//! - `SOMNOSCREEN_UNSEEN_CATEGORY` — `reject` (default) or `zero-encode`
//! - `RUST_LOG` — log filter (default `info`), logs go to stderr

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use somnoscreen::adapters::{ArtifactClassifier, UnseenCategoryPolicy};
use somnoscreen::ports::Classifier;
use somnoscreen::{AttributeSet, ScreeningService, ThresholdPolicy};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let model_path = model_path_from_env_or_args();
    let unseen_policy = unseen_policy_from_env()?;
    let threshold_policy = threshold_policy_from_env()?;

    tracing::info!(path = %model_path.display(), "Loading classifier artifact");
    let classifier = match ArtifactClassifier::load(&model_path, unseen_policy) {
        Ok(classifier) => Arc::new(classifier),
        Err(e) => {
            // Fatal: never accept input without a usable classifier.
            tracing::error!(error = %e, "Cannot start without a classifier artifact");
            bail!("cannot start: {e}");
        }
    };
    tracing::info!(
        categories = ?classifier.known_categories(),
        threshold = threshold_policy.threshold(),
        "Ready"
    );

    let service = ScreeningService::with_policy(classifier, threshold_policy);

    eprintln!("Enter one JSON attribute record per line (Ctrl-D to quit):");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }

        match AttributeSet::from_json(&line) {
            Ok(attrs) => match service.screen(&attrs) {
                Ok(report) => println!("{report}"),
                Err(e) => {
                    tracing::warn!(error = %e, "Screening request rejected");
                    println!("Could not evaluate this entry: {e}");
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable input record");
                println!("Could not read this entry: {e}");
            }
        }
    }

    Ok(())
}

fn model_path_from_env_or_args() -> PathBuf {
    std::env::args().nth(1).map_or_else(
        || {
            std::env::var("SOMNOSCREEN_MODEL")
                .unwrap_or_else(|_| "models/sleep_pipeline.json".to_string())
                .into()
        },
        PathBuf::from,
    )
}

fn unseen_policy_from_env() -> Result<UnseenCategoryPolicy> {
    match std::env::var("SOMNOSCREEN_UNSEEN_CATEGORY").as_deref() {
        Err(_) | Ok("reject") => Ok(UnseenCategoryPolicy::Reject),
        Ok("zero-encode") => Ok(UnseenCategoryPolicy::ZeroEncode),
        Ok(other) => bail!("SOMNOSCREEN_UNSEEN_CATEGORY must be 'reject' or 'zero-encode', got {other:?}"),
    }
}

fn threshold_policy_from_env() -> Result<ThresholdPolicy> {
    match std::env::var("SOMNOSCREEN_THRESHOLD") {
        Err(_) => Ok(ThresholdPolicy::default()),
        Ok(raw) => {
            let value: f64 = raw
                .parse()
                .with_context(|| format!("SOMNOSCREEN_THRESHOLD {raw:?} is not a number"))?;
            ThresholdPolicy::with_threshold(value).map_err(|e| anyhow::anyhow!(e))
        }
    }
}
