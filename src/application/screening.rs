//! Screening service: Orchestrates one-shot verdict inference.
//!
//! Pipeline per request:
//! 1. Validate the raw attributes (UI clamps are not trusted)
//! 2. Build the feature row and check schema conformance
//! 3. Invoke the classifier for a probability distribution
//! 4. Locate the "no disorder" probability and apply the threshold policy

use std::sync::Arc;

use crate::domain::{AttributeSet, ThresholdPolicy, VerdictReport, NO_DISORDER_LABEL};
use crate::ports::{Classifier, InferenceError};
use crate::ScreenError;

/// Service producing a screening verdict from raw attributes.
///
/// The classifier is injected once at construction and never mutated; the
/// service itself holds no per-request state, so two calls with identical
/// input and an unchanged classifier yield bit-identical results.
pub struct ScreeningService<C>
where
    C: Classifier,
{
    classifier: Arc<C>,
    policy: ThresholdPolicy,
}

impl<C> ScreeningService<C>
where
    C: Classifier,
{
    /// Create a service with the default 0.80 threshold policy.
    pub fn new(classifier: Arc<C>) -> Self {
        Self::with_policy(classifier, ThresholdPolicy::default())
    }

    /// Create a service with an explicit threshold policy.
    pub fn with_policy(classifier: Arc<C>, policy: ThresholdPolicy) -> Self {
        Self { classifier, policy }
    }

    #[must_use]
    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    /// Run one screening.
    ///
    /// # Errors
    /// - `Validation` if attribute values are out of plausible range
    /// - `Schema` if the built row does not match the trained schema
    /// - `Inference` if probability computation fails
    /// - `CategoryNotFound` if the classifier has no "no disorder" category
    ///   (training/serving skew)
    pub fn screen(&self, attrs: &AttributeSet) -> Result<VerdictReport, ScreenError> {
        attrs
            .validate()
            .map_err(|errors| ScreenError::Validation(errors.join("; ")))?;

        let row = attrs.to_feature_row();
        row.conforms_to(self.classifier.schema())?;

        tracing::debug!(columns = row.len(), "Invoking classifier");
        let probs = self.classifier.predict_probabilities(&row)?;

        if !probs.is_normalized() {
            return Err(InferenceError::InvalidDistribution { mass: probs.mass() }.into());
        }

        let p = probs
            .probability_of(NO_DISORDER_LABEL)
            .ok_or_else(|| ScreenError::CategoryNotFound {
                label: NO_DISORDER_LABEL.to_string(),
            })?;

        let report = self.policy.decide(p);
        tracing::info!(
            verdict = %report.verdict,
            confidence = report.confidence,
            p_no_disorder = p,
            "Screening complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        FeatureRow, FeatureSchema, ProbabilityVector, Sex, Verdict,
    };

    /// Fixed-output classifier for exercising the verdict engine alone.
    struct MockClassifier {
        schema: FeatureSchema,
        categories: Vec<String>,
        entries: Vec<(String, f64)>,
    }

    impl MockClassifier {
        fn returning(entries: Vec<(&str, f64)>) -> Self {
            let entries: Vec<(String, f64)> = entries
                .into_iter()
                .map(|(l, p)| (l.to_string(), p))
                .collect();
            Self {
                schema: FeatureSchema::screening(),
                categories: entries.iter().map(|(l, _)| l.clone()).collect(),
                entries,
            }
        }
    }

    impl Classifier for MockClassifier {
        fn schema(&self) -> &FeatureSchema {
            &self.schema
        }

        fn known_categories(&self) -> &[String] {
            &self.categories
        }

        fn predict_probabilities(
            &self,
            _row: &FeatureRow,
        ) -> Result<ProbabilityVector, InferenceError> {
            Ok(ProbabilityVector::new(self.entries.clone()))
        }
    }

    fn baseline_attrs() -> AttributeSet {
        AttributeSet {
            age: 35,
            sex: Sex::Male,
            sleep_duration_hours: 7.5,
            bmi_category: "Normal".to_string(),
            heart_rate_bpm: 70,
            daily_steps: 6000,
            systolic_bp: 120,
            diastolic_bp: 80,
        }
    }

    #[test]
    fn test_confident_healthy_verdict() {
        let classifier = Arc::new(MockClassifier::returning(vec![
            ("Insomnia", 0.10),
            ("None", 0.85),
            ("Sleep Apnea", 0.05),
        ]));
        let service = ScreeningService::new(classifier);

        let report = service.screen(&baseline_attrs()).expect("should screen");
        assert_eq!(report.verdict, Verdict::NoDisorder);
        assert!((report.confidence - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn test_low_healthy_probability_flags_disorder() {
        let classifier = Arc::new(MockClassifier::returning(vec![
            ("Insomnia", 0.45),
            ("None", 0.30),
            ("Sleep Apnea", 0.25),
        ]));
        let service = ScreeningService::new(classifier);

        let report = service.screen(&baseline_attrs()).expect("should screen");
        assert_eq!(report.verdict, Verdict::HasDisorder);
        assert!((report.confidence - 0.70).abs() < 1e-12);
    }

    #[test]
    fn test_missing_none_category_is_hard_failure() {
        let classifier = Arc::new(MockClassifier::returning(vec![
            ("Insomnia", 0.55),
            ("Sleep Apnea", 0.45),
        ]));
        let service = ScreeningService::new(classifier);

        let err = service.screen(&baseline_attrs()).expect_err("should fail");
        assert!(matches!(err, ScreenError::CategoryNotFound { label } if label == "None"));
    }

    #[test]
    fn test_denormalized_distribution_rejected() {
        let classifier = Arc::new(MockClassifier::returning(vec![
            ("None", 0.50),
            ("Insomnia", 0.30),
        ]));
        let service = ScreeningService::new(classifier);

        let err = service.screen(&baseline_attrs()).expect_err("should fail");
        assert!(matches!(
            err,
            ScreenError::Inference(InferenceError::InvalidDistribution { .. })
        ));
    }

    #[test]
    fn test_out_of_range_attributes_rejected_before_inference() {
        let classifier = Arc::new(MockClassifier::returning(vec![("None", 1.0)]));
        let service = ScreeningService::new(classifier);

        let mut attrs = baseline_attrs();
        attrs.heart_rate_bpm = 500;
        let err = service.screen(&attrs).expect_err("should reject");
        assert!(matches!(err, ScreenError::Validation(_)));
    }

    #[test]
    fn test_screening_is_idempotent() {
        let classifier = Arc::new(MockClassifier::returning(vec![
            ("None", 0.62),
            ("Insomnia", 0.38),
        ]));
        let service = ScreeningService::new(classifier);
        let attrs = baseline_attrs();

        let first = service.screen(&attrs).expect("first");
        let second = service.screen(&attrs).expect("second");
        assert_eq!(first.verdict, second.verdict);
        assert_eq!(first.confidence.to_bits(), second.confidence.to_bits());
    }

    #[test]
    fn test_custom_policy_is_honored() {
        let classifier = Arc::new(MockClassifier::returning(vec![
            ("None", 0.62),
            ("Insomnia", 0.38),
        ]));
        let policy = ThresholdPolicy::with_threshold(0.60).expect("valid");
        let service = ScreeningService::with_policy(classifier, policy);

        let report = service.screen(&baseline_attrs()).expect("should screen");
        assert_eq!(report.verdict, Verdict::NoDisorder);
    }
}
