//! Raw health/lifestyle attributes entered by the user.
//!
//! Field names here are Rust-side; [`AttributeSet::to_feature_row`] re-keys
//! them to the exact column names the classifier was trained with.

use serde::{Deserialize, Serialize};

use super::features::{columns, FeatureRow, SchemaError};

/// Biological sex, encoded with the same labels the training data uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Label byte-identical to the training data's `Gender` column values.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One complete screening input. All fields are required.
///
/// The BMI category is a free string because its vocabulary is discovered
/// from the training data, never fixed at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSet {
    /// Age in years (UI offers 20-70)
    pub age: u32,

    pub sex: Sex,

    /// Average nightly sleep in hours (UI offers 1.0-10.0)
    pub sleep_duration_hours: f64,

    /// BMI category label as it appears in the training data
    pub bmi_category: String,

    /// Resting heart rate (UI offers 60-90)
    pub heart_rate_bpm: u32,

    /// Average daily step count (UI offers 2000-12000)
    pub daily_steps: u32,

    /// Systolic blood pressure in mmHg
    pub systolic_bp: u32,

    /// Diastolic blood pressure in mmHg
    pub diastolic_bp: u32,
}

impl AttributeSet {
    /// Parse one attribute record from JSON.
    ///
    /// Missing or wrong-typed fields surface as a schema error rather than a
    /// raw deserializer trace, so the caller can reject the single request
    /// with a clear message.
    ///
    /// # Errors
    /// Returns [`SchemaError::Malformed`] if the record does not deserialize.
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(raw).map_err(|e| SchemaError::Malformed(e.to_string()))
    }

    /// Validate that all attributes are within plausible ranges.
    ///
    /// The UI clamps its sliders, but the core does not trust the caller to
    /// respect those clamps. Bounds here are deliberately wider than the UI's.
    ///
    /// # Errors
    /// Returns all violations as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(10..=120).contains(&self.age) {
            errors.push(format!("Age {} out of range [10, 120]", self.age));
        }
        if !(0.5..=16.0).contains(&self.sleep_duration_hours) {
            errors.push(format!(
                "Sleep duration {} out of range [0.5, 16]",
                self.sleep_duration_hours
            ));
        }
        if self.bmi_category.trim().is_empty() {
            errors.push("BMI category must not be empty".to_string());
        }
        if !(30..=220).contains(&self.heart_rate_bpm) {
            errors.push(format!(
                "Heart rate {} out of range [30, 220]",
                self.heart_rate_bpm
            ));
        }
        if self.daily_steps > 100_000 {
            errors.push(format!("Daily steps {} out of range [0, 100000]", self.daily_steps));
        }
        if !(60..=260).contains(&self.systolic_bp) {
            errors.push(format!(
                "Systolic BP {} out of range [60, 260]",
                self.systolic_bp
            ));
        }
        if !(30..=160).contains(&self.diastolic_bp) {
            errors.push(format!(
                "Diastolic BP {} out of range [30, 160]",
                self.diastolic_bp
            ));
        }
        if self.diastolic_bp >= self.systolic_bp {
            errors.push(format!(
                "Diastolic BP {} must be below systolic BP {}",
                self.diastolic_bp, self.systolic_bp
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Build the single-row feature table the classifier consumes.
    ///
    /// Re-keys every field to the training-time column name and performs no
    /// numeric transformation; scaling and encoding are the classifier
    /// pipeline's job, applied identically at fit and predict time.
    #[must_use]
    pub fn to_feature_row(&self) -> FeatureRow {
        let mut row = FeatureRow::new();
        row.set_number(columns::AGE, f64::from(self.age));
        row.set_text(columns::GENDER, self.sex.as_label());
        row.set_number(columns::SLEEP_DURATION, self.sleep_duration_hours);
        row.set_text(columns::BMI_CATEGORY, self.bmi_category.clone());
        row.set_number(columns::HEART_RATE, f64::from(self.heart_rate_bpm));
        row.set_number(columns::DAILY_STEPS, f64::from(self.daily_steps));
        row.set_number(columns::SYSTOLIC_BP, f64::from(self.systolic_bp));
        row.set_number(columns::DIASTOLIC_BP, f64::from(self.diastolic_bp));
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typical() -> AttributeSet {
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
    fn test_feature_row_has_exact_column_set() {
        let row = typical().to_feature_row();
        let mut names: Vec<&str> = row.column_names().collect();
        names.sort_unstable();
        let mut expected = vec![
            "Age",
            "Gender",
            "Sleep Duration",
            "BMI Category",
            "Heart Rate",
            "Daily Steps",
            "Systolic BP",
            "Diastolic BP",
        ];
        expected.sort_unstable();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_validation_accepts_typical_input() {
        assert!(typical().validate().is_ok());
    }

    #[test]
    fn test_validation_collects_all_violations() {
        let mut attrs = typical();
        attrs.age = 5;
        attrs.heart_rate_bpm = 300;
        attrs.systolic_bp = 70;
        attrs.diastolic_bp = 80; // above systolic
        let errors = attrs.validate().expect_err("should reject");
        assert!(errors.len() >= 3);
    }

    #[test]
    fn test_from_json_missing_field_is_schema_error() {
        // no daily_steps
        let raw = r#"{"age":35,"sex":"Male","sleep_duration_hours":7.5,
            "bmi_category":"Normal","heart_rate_bpm":70,
            "systolic_bp":120,"diastolic_bp":80}"#;
        let err = AttributeSet::from_json(raw).expect_err("should reject");
        assert!(matches!(err, SchemaError::Malformed(_)));
    }

    #[test]
    fn test_from_json_round_trip() {
        let attrs = typical();
        let raw = serde_json::to_string(&attrs).expect("serialize");
        let parsed = AttributeSet::from_json(&raw).expect("parse");
        assert_eq!(parsed, attrs);
    }
}
