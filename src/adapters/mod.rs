//! Adapters layer: Concrete implementations at the crate's edges.
//!
//! - `artifact`: the trained pipeline as a versioned JSON file, wrapped as a
//!   [`Classifier`](crate::ports::Classifier)
//! - `dataset`: training CSV loading and feature engineering
//! - `trainer`: the one-time preprocessing + classifier fit

pub mod artifact;
pub mod dataset;
pub mod trainer;

pub use artifact::{ArtifactClassifier, ArtifactError, PipelineArtifact, UnseenCategoryPolicy};
pub use dataset::{Dataset, DatasetError};
pub use trainer::{PipelineTrainer, TrainerConfig, TrainingError};
