//! Feature rows and schemas.
//!
//! A [`FeatureRow`] is the single-record table handed to the classifier. The
//! classifier binds columns by name, so names must be byte-identical to the
//! ones used at training time; [`FeatureSchema`] carries the trained
//! expectation and [`FeatureRow::conforms_to`] enforces it before inference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Training-time column names. Any change here breaks every existing artifact.
pub mod columns {
    pub const AGE: &str = "Age";
    pub const GENDER: &str = "Gender";
    pub const SLEEP_DURATION: &str = "Sleep Duration";
    pub const BMI_CATEGORY: &str = "BMI Category";
    pub const HEART_RATE: &str = "Heart Rate";
    pub const DAILY_STEPS: &str = "Daily Steps";
    pub const SYSTOLIC_BP: &str = "Systolic BP";
    pub const DIASTOLIC_BP: &str = "Diastolic BP";
}

/// Errors raised when a record does not match the trained schema.
///
/// All of these reject a single request; none of them crash the process.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Required column {0:?} is missing")]
    MissingColumn(String),

    #[error("Column {name:?} has the wrong type (expected {expected})")]
    TypeMismatch { name: String, expected: ColumnKind },

    #[error("Unexpected column {0:?} not present at training time")]
    UnexpectedColumn(String),

    #[error("Malformed record: {0}")]
    Malformed(String),
}

/// A single feature value. The classifier's preprocessor decides how each
/// kind is transformed (standardization vs. one-hot encoding).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Number(_) => ColumnKind::Numeric,
            Self::Text(_) => ColumnKind::Categorical,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

/// How a column is treated by the preprocessing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => f.write_str("numeric"),
            Self::Categorical => f.write_str("categorical"),
        }
    }
}

/// One column of the trained input schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// The exact set of columns (and their kinds) the classifier was fit with.
///
/// Persisted inside the pipeline artifact so serving can verify conformance
/// before every inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<SchemaColumn>,
}

impl FeatureSchema {
    #[must_use]
    pub fn new(columns: Vec<SchemaColumn>) -> Self {
        Self { columns }
    }

    /// The screening schema: the eight attribute columns in training order.
    #[must_use]
    pub fn screening() -> Self {
        let col = |name: &str, kind: ColumnKind| SchemaColumn {
            name: name.to_string(),
            kind,
        };
        Self::new(vec![
            col(columns::AGE, ColumnKind::Numeric),
            col(columns::GENDER, ColumnKind::Categorical),
            col(columns::SLEEP_DURATION, ColumnKind::Numeric),
            col(columns::BMI_CATEGORY, ColumnKind::Categorical),
            col(columns::HEART_RATE, ColumnKind::Numeric),
            col(columns::DAILY_STEPS, ColumnKind::Numeric),
            col(columns::SYSTOLIC_BP, ColumnKind::Numeric),
            col(columns::DIASTOLIC_BP, ColumnKind::Numeric),
        ])
    }

    #[must_use]
    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

/// A single-record feature table. Column order is irrelevant; the classifier
/// binds by name. Built once per screening and discarded after inference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_number(&mut self, name: &str, value: f64) {
        self.values
            .insert(name.to_string(), FeatureValue::Number(value));
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .insert(name.to_string(), FeatureValue::Text(value.into()));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Check this row against the trained schema: every expected column
    /// present with the right kind, and nothing extra.
    ///
    /// # Errors
    /// Returns the first mismatch found.
    pub fn conforms_to(&self, schema: &FeatureSchema) -> Result<(), SchemaError> {
        for col in schema.columns() {
            match self.values.get(&col.name) {
                None => return Err(SchemaError::MissingColumn(col.name.clone())),
                Some(value) if value.kind() != col.kind => {
                    return Err(SchemaError::TypeMismatch {
                        name: col.name.clone(),
                        expected: col.kind,
                    })
                }
                Some(_) => {}
            }
        }
        for name in self.values.keys() {
            if !schema.contains(name) {
                return Err(SchemaError::UnexpectedColumn(name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_row() -> FeatureRow {
        let mut row = FeatureRow::new();
        row.set_number(columns::AGE, 35.0);
        row.set_text(columns::GENDER, "Male");
        row.set_number(columns::SLEEP_DURATION, 7.5);
        row.set_text(columns::BMI_CATEGORY, "Normal");
        row.set_number(columns::HEART_RATE, 70.0);
        row.set_number(columns::DAILY_STEPS, 6000.0);
        row.set_number(columns::SYSTOLIC_BP, 120.0);
        row.set_number(columns::DIASTOLIC_BP, 80.0);
        row
    }

    #[test]
    fn test_full_row_conforms() {
        assert!(full_row().conforms_to(&FeatureSchema::screening()).is_ok());
    }

    #[test]
    fn test_missing_column_rejected() {
        let mut row = full_row();
        row.values.remove(columns::HEART_RATE);
        let err = row
            .conforms_to(&FeatureSchema::screening())
            .expect_err("should reject");
        assert!(matches!(err, SchemaError::MissingColumn(name) if name == columns::HEART_RATE));
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let mut row = full_row();
        row.set_text(columns::AGE, "thirty-five");
        let err = row
            .conforms_to(&FeatureSchema::screening())
            .expect_err("should reject");
        assert!(matches!(err, SchemaError::TypeMismatch { name, .. } if name == columns::AGE));
    }

    #[test]
    fn test_extra_column_rejected() {
        let mut row = full_row();
        row.set_number("Shoe Size", 43.0);
        let err = row
            .conforms_to(&FeatureSchema::screening())
            .expect_err("should reject");
        assert!(matches!(err, SchemaError::UnexpectedColumn(name) if name == "Shoe Size"));
    }
}
