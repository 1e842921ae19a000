//! Domain layer: Core screening types and logic.
//!
//! Pure types with no I/O. All types are serializable and validate their
//! own invariants.

mod attributes;
pub mod features;
mod probability;
mod verdict;

pub use attributes::{AttributeSet, Sex};
pub use features::{ColumnKind, FeatureRow, FeatureSchema, FeatureValue, SchemaColumn, SchemaError};
pub use probability::{ProbabilityVector, MASS_TOLERANCE, NO_DISORDER_LABEL};
pub use verdict::{ThresholdPolicy, Verdict, VerdictReport, DEFAULT_NO_DISORDER_THRESHOLD};
