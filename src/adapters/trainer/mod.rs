//! Pipeline trainer: one-time fit of the preprocessing + classifier.
//!
//! Fits, in order:
//! 1. Scaler statistics (mean/std) over the numeric columns
//! 2. One-hot vocabularies over the categorical columns, discovered from the
//!    data rather than fixed at compile time
//! 3. A multinomial logistic classifier over the encoded matrix, by
//!    full-batch gradient descent
//!
//! The fit is deterministic: weights start at zero and the data is consumed
//! in file order, so the same CSV always yields the same artifact. The
//! concrete classifier algorithm is this crate's choice; serving only ever
//! sees it through the [`Classifier`](crate::ports::Classifier) trait.

use std::collections::BTreeSet;

use ndarray::{Array1, Array2, Axis};

use crate::adapters::artifact::{
    EncoderColumn, PipelineArtifact, ScalerParams, ARTIFACT_VERSION,
};
use crate::adapters::dataset::Dataset;
use crate::domain::{ColumnKind, FeatureSchema};

/// Errors during the one-time fit.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("Need at least two outcome classes, found {found}")]
    TooFewClasses { found: usize },

    #[error("Training row {row} is missing column {column:?}")]
    IncompleteRow { row: usize, column: String },

    #[error("Fit diverged: loss became non-finite at epoch {epoch}")]
    Diverged { epoch: usize },
}

/// Gradient-descent hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct TrainerConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 penalty on the weights (not the intercepts).
    pub l2: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 400,
            l2: 1e-3,
        }
    }
}

/// Fits a [`PipelineArtifact`] from a loaded [`Dataset`].
#[derive(Debug, Default)]
pub struct PipelineTrainer {
    config: TrainerConfig,
}

impl PipelineTrainer {
    #[must_use]
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Run the full fit against the screening schema.
    ///
    /// # Errors
    /// Returns [`TrainingError`] if the data cannot support a fit.
    pub fn fit(&self, dataset: &Dataset) -> Result<PipelineArtifact, TrainingError> {
        let schema = FeatureSchema::screening();
        let numeric: Vec<&str> = schema
            .columns()
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect();
        let categorical: Vec<&str> = schema
            .columns()
            .iter()
            .filter(|c| c.kind == ColumnKind::Categorical)
            .map(|c| c.name.as_str())
            .collect();

        let categories = dataset.labels();
        if categories.len() < 2 {
            return Err(TrainingError::TooFewClasses {
                found: categories.len(),
            });
        }

        let scaler = fit_scaler(dataset, &numeric)?;
        let encoder = fit_encoder(dataset, &categorical)?;

        let n = dataset.len();
        let dim = numeric.len() + encoder.iter().map(|c| c.vocabulary.len()).sum::<usize>();
        tracing::info!(
            rows = n,
            classes = categories.len(),
            feature_dim = dim,
            "Fitting multinomial logistic classifier"
        );

        let x = encode_matrix(dataset, &scaler, &encoder)?;
        let y = one_hot_labels(dataset, &categories);

        let (weights, intercepts) = self.gradient_descent(&x, &y)?;

        Ok(PipelineArtifact {
            version: ARTIFACT_VERSION,
            trained_at: chrono::Utc::now(),
            schema,
            categories,
            scaler,
            encoder,
            weights: weights
                .axis_iter(Axis(0))
                .map(|row| row.to_vec())
                .collect(),
            intercepts: intercepts.to_vec(),
        })
    }

    /// Full-batch softmax-regression descent from zero-initialized weights.
    fn gradient_descent(
        &self,
        x: &Array2<f64>,
        y: &Array2<f64>,
    ) -> Result<(Array2<f64>, Array1<f64>), TrainingError> {
        let n = x.nrows() as f64;
        let classes = y.ncols();
        let dim = x.ncols();

        let mut weights = Array2::<f64>::zeros((classes, dim));
        let mut intercepts = Array1::<f64>::zeros(classes);

        for epoch in 0..self.config.epochs {
            // logits: n x classes
            let logits = x.dot(&weights.t()) + &intercepts;
            let probs = softmax_rows(&logits);

            let loss = cross_entropy(&probs, y);
            if !loss.is_finite() {
                return Err(TrainingError::Diverged { epoch });
            }
            if epoch % 100 == 0 {
                tracing::debug!(epoch, loss, "fit progress");
            }

            let residual = &probs - y; // n x classes
            let grad_w = residual.t().dot(x) / n + &(self.config.l2 * &weights);
            let grad_b = residual.sum_axis(Axis(0)) / n;

            weights = weights - self.config.learning_rate * grad_w;
            intercepts = intercepts - self.config.learning_rate * grad_b;
        }

        Ok((weights, intercepts))
    }
}

fn fit_scaler(dataset: &Dataset, numeric: &[&str]) -> Result<ScalerParams, TrainingError> {
    let n = dataset.len() as f64;
    let mut means = Vec::with_capacity(numeric.len());
    let mut stds = Vec::with_capacity(numeric.len());

    for name in numeric {
        let values = column_values(dataset, name)?;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        means.push(mean);
        // Constant columns standardize to zero instead of dividing by zero.
        stds.push(if std > 0.0 { std } else { 1.0 });
    }

    Ok(ScalerParams {
        columns: numeric.iter().map(|s| s.to_string()).collect(),
        means,
        stds,
    })
}

fn fit_encoder(
    dataset: &Dataset,
    categorical: &[&str],
) -> Result<Vec<EncoderColumn>, TrainingError> {
    categorical
        .iter()
        .map(|name| {
            let mut vocabulary = BTreeSet::new();
            for (i, example) in dataset.examples().iter().enumerate() {
                let value = example
                    .row
                    .get(name)
                    .and_then(|v| v.as_text())
                    .ok_or_else(|| TrainingError::IncompleteRow {
                        row: i + 1,
                        column: name.to_string(),
                    })?;
                vocabulary.insert(value.to_string());
            }
            Ok(EncoderColumn {
                name: name.to_string(),
                vocabulary: vocabulary.into_iter().collect(),
            })
        })
        .collect()
}

fn column_values(dataset: &Dataset, name: &str) -> Result<Vec<f64>, TrainingError> {
    dataset
        .examples()
        .iter()
        .enumerate()
        .map(|(i, example)| {
            example
                .row
                .get(name)
                .and_then(|v| v.as_number())
                .ok_or_else(|| TrainingError::IncompleteRow {
                    row: i + 1,
                    column: name.to_string(),
                })
        })
        .collect()
}

/// Encode the whole dataset exactly the way serving will encode one row.
fn encode_matrix(
    dataset: &Dataset,
    scaler: &ScalerParams,
    encoder: &[EncoderColumn],
) -> Result<Array2<f64>, TrainingError> {
    let dim = scaler.columns.len() + encoder.iter().map(|c| c.vocabulary.len()).sum::<usize>();
    let mut x = Array2::<f64>::zeros((dataset.len(), dim));

    for (i, example) in dataset.examples().iter().enumerate() {
        let mut j = 0;
        for (k, name) in scaler.columns.iter().enumerate() {
            let value = example
                .row
                .get(name)
                .and_then(|v| v.as_number())
                .ok_or_else(|| TrainingError::IncompleteRow {
                    row: i + 1,
                    column: name.clone(),
                })?;
            x[[i, j]] = (value - scaler.means[k]) / scaler.stds[k];
            j += 1;
        }
        for col in encoder {
            let value = example
                .row
                .get(&col.name)
                .and_then(|v| v.as_text())
                .ok_or_else(|| TrainingError::IncompleteRow {
                    row: i + 1,
                    column: col.name.clone(),
                })?;
            // Vocabulary was built from this same data, so the slot exists.
            if let Some(slot) = col.vocabulary.iter().position(|v| v == value) {
                x[[i, j + slot]] = 1.0;
            }
            j += col.vocabulary.len();
        }
    }

    Ok(x)
}

fn one_hot_labels(dataset: &Dataset, categories: &[String]) -> Array2<f64> {
    let mut y = Array2::<f64>::zeros((dataset.len(), categories.len()));
    for (i, example) in dataset.examples().iter().enumerate() {
        if let Some(c) = categories.iter().position(|l| *l == example.label) {
            y[[i, c]] = 1.0;
        }
    }
    y
}

fn softmax_rows(logits: &Array2<f64>) -> Array2<f64> {
    let mut out = logits.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|l| (l - max).exp());
        let total = row.sum();
        row.mapv_inplace(|e| e / total);
    }
    out
}

fn cross_entropy(probs: &Array2<f64>, y: &Array2<f64>) -> f64 {
    let n = probs.nrows() as f64;
    let eps = 1e-12;
    -(y * &probs.mapv(|p| (p + eps).ln())).sum() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifact::{ArtifactClassifier, UnseenCategoryPolicy};
    use crate::ports::Classifier;

    /// Synthetic, cleanly separable data: healthy sleepers sleep long with
    /// low heart rates; insomniacs the opposite.
    fn separable_csv() -> String {
        let mut csv = String::from(
            "Gender,Age,Sleep Duration,BMI Category,Blood Pressure,Heart Rate,Daily Steps,Sleep Disorder\n",
        );
        for i in 0..20 {
            csv.push_str(&format!(
                "Male,{},8.{},Normal,118/78,6{},8000,\n",
                30 + i,
                i % 10,
                i % 10
            ));
            csv.push_str(&format!(
                "Female,{},4.{},Overweight,142/92,8{},3000,Insomnia\n",
                40 + i,
                i % 10,
                i % 10
            ));
        }
        csv
    }

    fn fit_separable() -> PipelineArtifact {
        let dataset = Dataset::from_reader(separable_csv().as_bytes()).expect("load");
        PipelineTrainer::default().fit(&dataset).expect("fit")
    }

    #[test]
    fn test_fit_discovers_vocabularies_and_classes() {
        let artifact = fit_separable();
        assert_eq!(artifact.categories, vec!["Insomnia", "None"]);

        let bmi = artifact
            .encoder
            .iter()
            .find(|c| c.name == "BMI Category")
            .expect("bmi encoder");
        assert_eq!(bmi.vocabulary, vec!["Normal", "Overweight"]);
    }

    #[test]
    fn test_fit_yields_valid_artifact() {
        let artifact = fit_separable();
        assert!(artifact.validate().is_ok());
        assert_eq!(artifact.weights.len(), 2);
        assert_eq!(artifact.weights[0].len(), artifact.feature_dim());
    }

    #[test]
    fn test_fitted_classifier_separates_training_data() {
        let dataset = Dataset::from_reader(separable_csv().as_bytes()).expect("load");
        let artifact = PipelineTrainer::default().fit(&dataset).expect("fit");
        let classifier =
            ArtifactClassifier::from_artifact(artifact, UnseenCategoryPolicy::default())
                .expect("wrap");

        for example in dataset.examples() {
            let probs = classifier
                .predict_probabilities(&example.row)
                .expect("predict");
            assert!(probs.is_normalized());
            let best = probs
                .entries()
                .iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .expect("non-empty");
            assert_eq!(best.0, example.label);
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let a = fit_separable();
        let b = fit_separable();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.intercepts, b.intercepts);
    }

    #[test]
    fn test_single_class_data_rejected() {
        let csv = "\
Gender,Age,Sleep Duration,BMI Category,Blood Pressure,Heart Rate,Daily Steps,Sleep Disorder
Male,30,7.0,Normal,120/80,70,6000,
Female,35,7.5,Normal,118/78,68,7000,
";
        let dataset = Dataset::from_reader(csv.as_bytes()).expect("load");
        let err = PipelineTrainer::default().fit(&dataset).expect_err("reject");
        assert!(matches!(err, TrainingError::TooFewClasses { found: 1 }));
    }
}
