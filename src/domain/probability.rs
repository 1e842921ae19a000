//! Classifier output: a probability distribution over disorder categories.

use serde::{Deserialize, Serialize};

/// Label of the "no disorder" category.
///
/// Matches the value the training flow writes into rows whose disorder cell
/// is empty. Locating this label in the classifier output is what turns a
/// multi-class distribution into a binary screening signal.
pub const NO_DISORDER_LABEL: &str = "None";

/// Tolerance when checking that probability mass sums to 1.0.
pub const MASS_TOLERANCE: f64 = 1e-6;

/// An ordered set of `(category label, probability)` pairs produced by one
/// inference call. Never cached; built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityVector {
    entries: Vec<(String, f64)>,
}

impl ProbabilityVector {
    #[must_use]
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probability assigned to `label`, by exact match.
    #[must_use]
    pub fn probability_of(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }

    /// Total probability mass.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Whether this is a valid distribution: every probability in [0, 1] and
    /// total mass within tolerance of 1.0.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.entries.iter().all(|(_, p)| (0.0..=1.0).contains(p))
            && (self.mass() - 1.0).abs() <= MASS_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_lookup_is_exact_match() {
        let probs = ProbabilityVector::new(vec![
            ("Insomnia".to_string(), 0.1),
            ("None".to_string(), 0.85),
            ("Sleep Apnea".to_string(), 0.05),
        ]);
        assert_eq!(probs.probability_of(NO_DISORDER_LABEL), Some(0.85));
        assert_eq!(probs.probability_of("none"), None);
        assert_eq!(probs.probability_of("No Disorder"), None);
    }

    #[test]
    fn test_mass_check() {
        let good = ProbabilityVector::new(vec![
            ("None".to_string(), 0.6),
            ("Insomnia".to_string(), 0.4),
        ]);
        assert!(good.is_normalized());

        let short = ProbabilityVector::new(vec![
            ("None".to_string(), 0.6),
            ("Insomnia".to_string(), 0.3),
        ]);
        assert!(!short.is_normalized());

        let negative = ProbabilityVector::new(vec![
            ("None".to_string(), 1.2),
            ("Insomnia".to_string(), -0.2),
        ]);
        assert!(!negative.is_normalized());
    }
}
