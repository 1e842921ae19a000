//! Ports layer: Trait definitions for external capabilities.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the screening core and the externally-owned classifier.

mod classifier;

pub use classifier::{Classifier, InferenceError};
