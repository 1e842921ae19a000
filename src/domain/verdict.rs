//! Screening verdicts and the threshold policy that produces them.

use serde::{Deserialize, Serialize};

/// Default cutoff on the "no disorder" probability.
///
/// Deliberately conservative: the classifier must be at least 80% sure the
/// person is healthy before the system says so, trading false alarms for
/// fewer false reassurances.
pub const DEFAULT_NO_DISORDER_THRESHOLD: f64 = 0.80;

/// Binary screening outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// No sleep disorder indicated
    NoDisorder,
    /// A sleep disorder is indicated; follow-up recommended
    HasDisorder,
}

impl Verdict {
    /// Human-readable description for rendering.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoDisorder => "No sleep disorder indicated",
            Self::HasDisorder => "Sleep disorder indicated - professional follow-up recommended",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDisorder => write!(f, "NO DISORDER"),
            Self::HasDisorder => write!(f, "HAS DISORDER"),
        }
    }
}

/// The fixed decision rule collapsing a multi-class distribution into a
/// binary verdict via the "no disorder" probability alone.
///
/// This intentionally ignores how probability is split among the disorder
/// subtypes; the product surface is a screening signal, not a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    no_disorder_threshold: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            no_disorder_threshold: DEFAULT_NO_DISORDER_THRESHOLD,
        }
    }
}

impl ThresholdPolicy {
    /// Create a policy with a custom cutoff.
    ///
    /// # Errors
    /// Returns an error message if the cutoff is outside (0, 1].
    pub fn with_threshold(threshold: f64) -> Result<Self, String> {
        if threshold > 0.0 && threshold <= 1.0 {
            Ok(Self {
                no_disorder_threshold: threshold,
            })
        } else {
            Err(format!("Threshold {threshold} out of range (0, 1]"))
        }
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.no_disorder_threshold
    }

    /// Apply the decision rule to the "no disorder" probability `p`.
    ///
    /// The boundary is inclusive on the healthy side: `p` equal to the
    /// threshold yields `NoDisorder` with confidence `p`; anything below
    /// yields `HasDisorder` with confidence `1 - p`.
    #[must_use]
    pub fn decide(&self, p: f64) -> VerdictReport {
        let (verdict, confidence) = if p >= self.no_disorder_threshold {
            (Verdict::NoDisorder, p)
        } else {
            (Verdict::HasDisorder, 1.0 - p)
        };
        VerdictReport::new(verdict, confidence)
    }
}

/// One rendered screening result. Exists for one render cycle; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictReport {
    pub verdict: Verdict,

    /// Confidence in the emitted verdict, in [0, 1]
    pub confidence: f64,

    /// When this screening was evaluated
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl VerdictReport {
    #[must_use]
    pub fn new(verdict: Verdict, confidence: f64) -> Self {
        Self {
            verdict,
            confidence,
            created_at: chrono::Utc::now(),
        }
    }

    /// Confidence as a percentage for display.
    #[must_use]
    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}

impl std::fmt::Display for VerdictReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (confidence {:.2}%)",
            self.verdict.description(),
            self.confidence_percent()
        )
    }
}
