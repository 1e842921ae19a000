//! # Somnoscreen
//!
//! Sleep-disorder screening pipeline: maps raw health/lifestyle attributes to a
//! binary verdict by thresholding the probability a trained classifier assigns
//! to the "no disorder" category.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (AttributeSet, FeatureRow, ProbabilityVector, Verdict)
//! - `ports`: Trait definition for the opaque classifier capability
//! - `adapters`: Concrete implementations (JSON pipeline artifact, CSV dataset,
//!   trainer)
//! - `application`: The screening service orchestrating domain and ports
//!
//! The classifier is an injected, read-only dependency with a
//! construct-once / use-many lifecycle. One screening request performs one
//! feature build and one inference; no state persists between requests.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use application::ScreeningService;
pub use domain::{AttributeSet, Sex, ThresholdPolicy, Verdict, VerdictReport};

/// Result type for somnoscreen operations.
pub type Result<T> = std::result::Result<T, ScreenError>;

/// Main error type for somnoscreen.
///
/// Every variant except `Artifact` is scoped to a single screening or
/// training invocation; only an artifact failure at startup is fatal.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("Classifier artifact unusable: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Feature schema mismatch: {0}")]
    Schema(#[from] domain::SchemaError),

    #[error("Inference failed: {0}")]
    Inference(#[from] ports::InferenceError),

    #[error("Category {label:?} not among the classifier's known categories")]
    CategoryNotFound { label: String },

    #[error("Invalid attribute values: {0}")]
    Validation(String),

    #[error("Training data unusable: {0}")]
    Dataset(#[from] adapters::DatasetError),

    #[error("Model training failed: {0}")]
    Training(#[from] adapters::TrainingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScreenError {
    /// Whether this failure must halt the process.
    ///
    /// Per-request failures reject one screening without terminating the
    /// serving loop; a missing or corrupt artifact at startup is the only
    /// fatal condition.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Artifact(_))
    }
}
