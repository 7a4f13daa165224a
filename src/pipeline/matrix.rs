//! Null-free numeric feature matrix handed to model backends

use anyhow::Result;
use ndarray::{Array2, ArrayView1, Axis};
use polars::prelude::*;

use super::error::PrepError;
use super::loader::column_names;
use super::missing::ensure_no_nulls;

/// Dense matrix with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self, PrepError> {
        if values.ncols() != columns.len() {
            return Err(PrepError::WidthMismatch {
                expected: columns.len(),
                actual: values.ncols(),
            });
        }
        Ok(Self { columns, values })
    }

    /// Gather `columns` from the frame in the given order
    pub fn from_frame(df: &DataFrame, columns: &[String]) -> Result<Self, PrepError> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|name| df.column(name).is_err())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PrepError::SchemaMismatch {
                missing,
                available: column_names(df),
            });
        }

        let selected = df.select(columns.iter().map(String::as_str))?;
        if let Some(column) = selected
            .get_columns()
            .iter()
            .find(|c| !c.dtype().is_primitive_numeric())
        {
            return Err(PrepError::NonNumericFeature(column.name().to_string()));
        }
        ensure_no_nulls(&selected)?;

        let values = selected.to_ndarray::<Float64Type>(IndexOrder::C)?;
        Self::new(columns.to_vec(), values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.values.axis_iter(Axis(0))
    }

    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.column(index)
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .zip(self.values.axis_iter(Axis(1)))
            .map(|(name, values)| Column::new(name.as_str().into(), values.to_vec()))
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}
