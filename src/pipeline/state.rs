//! Fitted preparation state shared by bulk preparation and single-record scoring
//!
//! Everything learned from the training table lives here: feature order,
//! imputation means, one-hot layout and scaler parameters. Scoring a new
//! record only ever reads these values; nothing is recomputed from the record.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::PrepError;
use super::matrix::FeatureMatrix;
use super::onehot::OneHotColumn;
use super::scale::StandardScaler;

/// Which downstream model the features are prepared for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Scaled schema features for a clustering backend
    #[default]
    Segmentation,
    /// Unscaled features plus one-hot residuals and a fitness label
    Classification,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Segmentation => write!(f, "segmentation"),
            Variant::Classification => write!(f, "classification"),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "segmentation" | "kmeans" | "cluster" => Ok(Variant::Segmentation),
            "classification" | "classifier" | "forest" => Ok(Variant::Classification),
            _ => Err(format!(
                "Unknown variant: '{}'. Use 'segmentation' or 'classification'.",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedState {
    pub schema: String,
    pub variant: Variant,
    /// Column order of every feature row
    pub feature_columns: Vec<String>,
    /// Means used to fill numeric nulls, one per numeric feature
    pub impute_means: BTreeMap<String, f64>,
    pub placeholder: String,
    pub one_hot: Vec<OneHotColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,
    pub created_at: String,
    pub version: String,
}

impl FittedState {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize fitted state")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write fitted state: {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fitted state: {}", path.display()))?;
        let state: FittedState = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse fitted state: {}", path.display()))?;
        if let Some(scaler) = &state.scaler {
            if scaler.width() != state.feature_columns.len() {
                return Err(PrepError::WidthMismatch {
                    expected: state.feature_columns.len(),
                    actual: scaler.width(),
                }
                .into());
            }
        }
        Ok(state)
    }

    /// Feature columns absent from `record` that will be filled from the fitted state
    pub fn missing_features(&self, record: &BTreeMap<String, f64>) -> Vec<String> {
        self.feature_columns
            .iter()
            .filter(|c| !record.contains_key(*c))
            .cloned()
            .collect()
    }

    /// Values for one-hot indicators the record does not set.
    ///
    /// A layout with none of its indicators present encodes as the missing
    /// placeholder, the value a null cell takes in the bulk table. When some
    /// indicators are given, the others are zero.
    fn indicator_defaults(&self, record: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        let mut defaults = BTreeMap::new();
        for layout in &self.one_hot {
            let names = layout.indicator_names();
            if names.iter().any(|name| record.contains_key(name)) {
                defaults.extend(names.into_iter().map(|name| (name, 0.0)));
            } else {
                let values = layout.encode(Some(self.placeholder.as_str()));
                defaults.extend(names.into_iter().zip(values));
            }
        }
        defaults
    }

    /// Unscaled feature row for one already-encoded record.
    ///
    /// Keys outside the feature set are rejected. Absent schema features take
    /// the fitted imputation mean and absent indicators are filled from the
    /// one-hot layout, exactly as a null in the bulk table would be.
    pub fn encode_record(&self, record: &BTreeMap<String, f64>) -> Result<Array1<f64>, PrepError> {
        if let Some(unknown) = record.keys().find(|k| !self.feature_columns.contains(*k)) {
            return Err(PrepError::UnknownFeature {
                column: unknown.clone(),
                expected: self.feature_columns.clone(),
            });
        }

        let indicators = self.indicator_defaults(record);
        let mut row = Vec::with_capacity(self.feature_columns.len());
        let mut unfilled = Vec::new();
        for column in &self.feature_columns {
            match record
                .get(column)
                .or_else(|| indicators.get(column))
                .or_else(|| self.impute_means.get(column))
            {
                Some(v) => row.push(*v),
                None => unfilled.push(column.clone()),
            }
        }

        if !unfilled.is_empty() {
            return Err(PrepError::NullResidue {
                columns: unfilled,
                rows: vec![0],
            });
        }

        Ok(Array1::from(row))
    }

    /// Model-ready row for one record: encode, then apply the fitted scaler
    pub fn transform_record(&self, record: &BTreeMap<String, f64>) -> Result<Array1<f64>, PrepError> {
        let row = self.encode_record(record)?;
        match &self.scaler {
            Some(scaler) => scaler.transform_row(row.view()),
            None => Ok(row),
        }
    }

    /// Apply the fitted scaler to a matrix with the fitted column order
    pub fn transform_matrix(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, PrepError> {
        if matrix.columns() != self.feature_columns.as_slice() {
            return Err(PrepError::WidthMismatch {
                expected: self.feature_columns.len(),
                actual: matrix.n_cols(),
            });
        }
        match &self.scaler {
            Some(scaler) => scaler.transform(matrix),
            None => Ok(matrix.clone()),
        }
    }
}
