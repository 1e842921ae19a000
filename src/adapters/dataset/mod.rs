//! Training dataset adapter: the sleep health & lifestyle CSV.
//!
//! Consumes only the columns the pipeline was designed around; anything else
//! in the file (person id, occupation, stress level, ...) is ignored. Two
//! pieces of feature engineering happen here, before any fitting:
//!
//! - the composite `Blood Pressure` column (`"<systolic>/<diastolic>"`) is
//!   split into two numeric columns
//! - an empty `Sleep Disorder` cell means the person has no disorder and is
//!   filled with the explicit `"None"` label, never treated as missing data

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{features::columns, FeatureRow, NO_DISORDER_LABEL};

/// Name of the target column in the training CSV.
pub const TARGET_COLUMN: &str = "Sleep Disorder";

/// Errors while reading the training table.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset file not found: {path}")]
    Missing { path: String },

    #[error("Failed to read dataset: {0}")]
    Read(#[from] csv::Error),

    #[error("Row {row}: blood pressure {value:?} is not \"<systolic>/<diastolic>\"")]
    MalformedBloodPressure { row: usize, value: String },

    #[error("Dataset contains no usable rows")]
    Empty,

    #[error("IO error reading dataset: {0}")]
    Io(#[from] std::io::Error),
}

/// The raw CSV shape. Extra columns in the file deserialize to nothing.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Age")]
    age: f64,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Sleep Duration")]
    sleep_duration: f64,
    #[serde(rename = "BMI Category")]
    bmi_category: String,
    #[serde(rename = "Blood Pressure")]
    blood_pressure: String,
    #[serde(rename = "Heart Rate")]
    heart_rate: f64,
    #[serde(rename = "Daily Steps")]
    daily_steps: f64,
    #[serde(rename = "Sleep Disorder", default)]
    sleep_disorder: Option<String>,
}

/// One labeled training row, already re-keyed to the serving feature schema.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub row: FeatureRow,
    pub label: String,
}

/// The loaded training table.
#[derive(Debug, Clone)]
pub struct Dataset {
    examples: Vec<TrainingExample>,
}

impl Dataset {
    /// Load the dataset from a CSV file.
    ///
    /// # Errors
    /// Returns [`DatasetError`] if the file is missing, malformed, or empty.
    pub fn from_csv_path(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DatasetError::Missing {
                    path: path.display().to_string(),
                }
            } else {
                DatasetError::Io(e)
            }
        })?;
        let dataset = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.len(),
            "Loaded training dataset"
        );
        Ok(dataset)
    }

    /// Load the dataset from any CSV reader.
    ///
    /// # Errors
    /// Returns [`DatasetError`] if parsing fails or no rows remain.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut examples = Vec::new();
        for (i, record) in csv_reader.deserialize::<RawRecord>().enumerate() {
            let record = record?;
            // Header is line 1, first data row is line 2.
            examples.push(Self::to_example(record, i + 2)?);
        }

        if examples.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { examples })
    }

    fn to_example(record: RawRecord, row_number: usize) -> Result<TrainingExample, DatasetError> {
        let (systolic, diastolic) = split_blood_pressure(&record.blood_pressure)
            .ok_or_else(|| DatasetError::MalformedBloodPressure {
                row: row_number,
                value: record.blood_pressure.clone(),
            })?;

        let label = match record.sleep_disorder {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => NO_DISORDER_LABEL.to_string(),
        };

        let mut row = FeatureRow::new();
        row.set_number(columns::AGE, record.age);
        row.set_text(columns::GENDER, record.gender);
        row.set_number(columns::SLEEP_DURATION, record.sleep_duration);
        row.set_text(columns::BMI_CATEGORY, record.bmi_category);
        row.set_number(columns::HEART_RATE, record.heart_rate);
        row.set_number(columns::DAILY_STEPS, record.daily_steps);
        row.set_number(columns::SYSTOLIC_BP, systolic);
        row.set_number(columns::DIASTOLIC_BP, diastolic);

        Ok(TrainingExample { row, label })
    }

    #[must_use]
    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Distinct outcome labels, sorted.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.examples.iter().map(|e| e.label.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }
}

/// Split a `"<systolic>/<diastolic>"` reading into two numbers.
#[must_use]
pub fn split_blood_pressure(value: &str) -> Option<(f64, f64)> {
    let (sys, dia) = value.split_once('/')?;
    let sys: f64 = sys.trim().parse().ok()?;
    let dia: f64 = dia.trim().parse().ok()?;
    Some((sys, dia))
}
