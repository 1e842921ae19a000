//! Pipeline artifact adapter: the trained classifier as a JSON file.
//!
//! The artifact bundles everything serving needs to reproduce training-time
//! preprocessing byte-for-byte: the input schema, per-column scaler
//! statistics, one-hot vocabularies, and the linear classifier weights.
//! Scaling and encoding live here, applied symmetrically with the trainer;
//! the feature builder upstream never transforms values.
//!
//! # Unseen categories
//!
//! A categorical value absent from the trained vocabulary is rejected by
//! default with a clear per-request error. The tolerant alternative
//! ([`UnseenCategoryPolicy::ZeroEncode`]) encodes the value as an all-zero
//! block, reproducing the behavior of encoders configured to ignore unseen
//! values; it must be opted into explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ColumnKind, FeatureRow, FeatureSchema, ProbabilityVector};
use crate::ports::{Classifier, InferenceError};

/// Current artifact format version. Bump on any incompatible change.
pub const ARTIFACT_VERSION: u32 = 1;

/// Errors while loading or validating a pipeline artifact.
///
/// All of these are fatal at startup: a serving process must not accept
/// input without a usable classifier.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact file not found: {path}")]
    Missing { path: String },

    #[error("Artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported artifact version {found} (expected {ARTIFACT_VERSION})")]
    UnsupportedVersion { found: u32 },

    #[error("Artifact is internally inconsistent: {0}")]
    Invalid(String),

    #[error("IO error reading artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// How to encode a categorical value that was never observed at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnseenCategoryPolicy {
    /// Reject the request with [`InferenceError::UnknownCategory`].
    #[default]
    Reject,
    /// Encode as an all-zero one-hot block and continue.
    ZeroEncode,
}

/// Standardization statistics for the numeric columns, in encoding order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub columns: Vec<String>,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

/// One-hot vocabulary for a single categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderColumn {
    pub name: String,
    /// Observed category values, in one-hot slot order.
    pub vocabulary: Vec<String>,
}

/// The persisted trained pipeline.
///
/// `weights` is one row per category (in `categories` order), each of length
/// [`PipelineArtifact::feature_dim`]: scaled numerics first, then the one-hot
/// blocks in `encoder` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub version: u32,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub schema: FeatureSchema,
    /// Outcome categories, in weight-row order.
    pub categories: Vec<String>,
    pub scaler: ScalerParams,
    pub encoder: Vec<EncoderColumn>,
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl PipelineArtifact {
    /// Width of the encoded feature vector.
    #[must_use]
    pub fn feature_dim(&self) -> usize {
        self.scaler.columns.len() + self.encoder.iter().map(|c| c.vocabulary.len()).sum::<usize>()
    }

    /// Load and validate an artifact from disk.
    ///
    /// # Errors
    /// Returns [`ArtifactError`]; every variant is fatal at startup.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::Missing {
                    path: path.display().to_string(),
                }
            } else {
                ArtifactError::Io(e)
            }
        })?;
        let artifact: Self = serde_json::from_str(&raw)?;
        artifact.validate()?;
        tracing::info!(
            path = %path.display(),
            categories = artifact.categories.len(),
            feature_dim = artifact.feature_dim(),
            "Loaded pipeline artifact"
        );
        Ok(artifact)
    }

    /// Persist the artifact as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns [`ArtifactError`] on IO or serialization failure.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Check internal consistency: version, dimensions, schema coverage.
    ///
    /// # Errors
    /// Returns `UnsupportedVersion` or `Invalid` describing the first defect.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.version != ARTIFACT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.version,
            });
        }
        if self.categories.is_empty() {
            return Err(ArtifactError::Invalid("no outcome categories".to_string()));
        }
        if self.scaler.means.len() != self.scaler.columns.len()
            || self.scaler.stds.len() != self.scaler.columns.len()
        {
            return Err(ArtifactError::Invalid(
                "scaler statistics do not match scaler columns".to_string(),
            ));
        }
        if let Some(bad) = self.scaler.stds.iter().find(|s| **s <= 0.0 || !s.is_finite()) {
            return Err(ArtifactError::Invalid(format!(
                "non-positive scaler std {bad}"
            )));
        }
        let dim = self.feature_dim();
        if self.weights.len() != self.categories.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} weight rows for {} categories",
                self.weights.len(),
                self.categories.len()
            )));
        }
        if let Some(row) = self.weights.iter().find(|r| r.len() != dim) {
            return Err(ArtifactError::Invalid(format!(
                "weight row of length {} (feature dim is {dim})",
                row.len()
            )));
        }
        if self.intercepts.len() != self.categories.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} intercepts for {} categories",
                self.intercepts.len(),
                self.categories.len()
            )));
        }

        // Every scaler/encoder column must be a schema column of the right
        // kind, and the schema must carry nothing else.
        for name in &self.scaler.columns {
            match self.schema.columns().iter().find(|c| &c.name == name) {
                Some(c) if c.kind == ColumnKind::Numeric => {}
                _ => {
                    return Err(ArtifactError::Invalid(format!(
                        "scaler column {name:?} is not a numeric schema column"
                    )))
                }
            }
        }
        for col in &self.encoder {
            match self.schema.columns().iter().find(|c| c.name == col.name) {
                Some(c) if c.kind == ColumnKind::Categorical => {}
                _ => {
                    return Err(ArtifactError::Invalid(format!(
                        "encoder column {:?} is not a categorical schema column",
                        col.name
                    )))
                }
            }
        }
        if self.schema.len() != self.scaler.columns.len() + self.encoder.len() {
            return Err(ArtifactError::Invalid(
                "schema columns not covered by scaler and encoder".to_string(),
            ));
        }
        Ok(())
    }
}

/// A [`Classifier`] backed by a validated [`PipelineArtifact`].
///
/// Immutable after construction; safe to share behind `Arc` for the process
/// lifetime.
pub struct ArtifactClassifier {
    artifact: PipelineArtifact,
    unseen_policy: UnseenCategoryPolicy,
}

impl ArtifactClassifier {
    /// Load the artifact at `path` and wrap it as a classifier.
    ///
    /// # Errors
    /// Returns [`ArtifactError`] if the file is missing, corrupt, or
    /// internally inconsistent.
    pub fn load(path: &Path, unseen_policy: UnseenCategoryPolicy) -> Result<Self, ArtifactError> {
        let artifact = PipelineArtifact::load(path)?;
        Ok(Self {
            artifact,
            unseen_policy,
        })
    }

    /// Wrap an in-memory artifact, validating it first.
    ///
    /// # Errors
    /// Returns [`ArtifactError`] if the artifact is inconsistent.
    pub fn from_artifact(
        artifact: PipelineArtifact,
        unseen_policy: UnseenCategoryPolicy,
    ) -> Result<Self, ArtifactError> {
        artifact.validate()?;
        Ok(Self {
            artifact,
            unseen_policy,
        })
    }

    #[must_use]
    pub fn artifact(&self) -> &PipelineArtifact {
        &self.artifact
    }

    /// Encode one row into the dense vector the linear model consumes:
    /// standardized numerics, then one-hot categorical blocks.
    fn encode(&self, row: &FeatureRow) -> Result<Vec<f64>, InferenceError> {
        let mut x = Vec::with_capacity(self.artifact.feature_dim());

        for (i, name) in self.artifact.scaler.columns.iter().enumerate() {
            let value = row
                .get(name)
                .and_then(|v| v.as_number())
                .ok_or_else(|| {
                    InferenceError::Failed(format!("numeric column {name:?} absent from row"))
                })?;
            x.push((value - self.artifact.scaler.means[i]) / self.artifact.scaler.stds[i]);
        }

        for col in &self.artifact.encoder {
            let value = row
                .get(&col.name)
                .and_then(|v| v.as_text())
                .ok_or_else(|| {
                    InferenceError::Failed(format!(
                        "categorical column {:?} absent from row",
                        col.name
                    ))
                })?;
            let slot = col.vocabulary.iter().position(|v| v == value);
            match (slot, self.unseen_policy) {
                (Some(i), _) => {
                    for j in 0..col.vocabulary.len() {
                        x.push(if i == j { 1.0 } else { 0.0 });
                    }
                }
                (None, UnseenCategoryPolicy::Reject) => {
                    return Err(InferenceError::UnknownCategory {
                        column: col.name.clone(),
                        value: value.to_string(),
                    })
                }
                (None, UnseenCategoryPolicy::ZeroEncode) => {
                    tracing::warn!(
                        column = %col.name,
                        value = %value,
                        "Unseen category zero-encoded"
                    );
                    x.extend(std::iter::repeat(0.0).take(col.vocabulary.len()));
                }
            }
        }

        Ok(x)
    }
}

impl Classifier for ArtifactClassifier {
    fn schema(&self) -> &FeatureSchema {
        &self.artifact.schema
    }

    fn known_categories(&self) -> &[String] {
        &self.artifact.categories
    }

    fn predict_probabilities(&self, row: &FeatureRow) -> Result<ProbabilityVector, InferenceError> {
        let x = self.encode(row)?;

        let logits: Vec<f64> = self
            .artifact
            .weights
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(w, b)| w.iter().zip(&x).map(|(wi, xi)| wi * xi).sum::<f64>() + b)
            .collect();

        if logits.iter().any(|l| !l.is_finite()) {
            return Err(InferenceError::Failed(
                "non-finite score during probability computation".to_string(),
            ));
        }

        Ok(ProbabilityVector::new(
            softmax(&logits)
                .into_iter()
                .zip(&self.artifact.categories)
                .map(|(p, label)| (label.clone(), p))
                .collect(),
        ))
    }
}

/// Numerically stable softmax.
pub(crate) fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
