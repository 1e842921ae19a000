//! Classifier port: Trait for the opaque probabilistic classifier.
//!
//! The screening core never depends on a concrete model. Anything that can
//! report its trained schema, its category list, and a probability
//! distribution per feature row can sit behind this trait, including mocks
//! in tests.

use crate::domain::{FeatureRow, FeatureSchema, ProbabilityVector};

/// Errors during probability computation.
///
/// Every variant is scoped to the single request that triggered it.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// A categorical value never observed during training, under the
    /// rejecting unseen-category policy.
    #[error("Value {value:?} in column {column:?} was not observed during training")]
    UnknownCategory { column: String, value: String },

    /// The model produced something that is not a probability distribution.
    #[error("Classifier output is not a valid distribution (mass {mass})")]
    InvalidDistribution { mass: f64 },

    /// Any other numerical or resource failure during inference.
    #[error("Probability computation failed: {0}")]
    Failed(String),
}

/// The trained-classifier capability.
///
/// Implementations are immutable after construction and shared read-only
/// across requests (`construct-once / use-many / no mutation`).
pub trait Classifier: Send + Sync {
    /// The exact input schema this classifier was fit with.
    fn schema(&self) -> &FeatureSchema;

    /// The disjoint outcome categories this classifier was trained on.
    fn known_categories(&self) -> &[String];

    /// Compute the probability distribution over categories for one row.
    ///
    /// The row must already conform to [`Classifier::schema`]; any internal
    /// scaling or encoding is applied here, symmetrically with training.
    ///
    /// # Errors
    /// Returns [`InferenceError`] if the computation fails; the failure is
    /// confined to this request.
    fn predict_probabilities(&self, row: &FeatureRow) -> Result<ProbabilityVector, InferenceError>;
}
