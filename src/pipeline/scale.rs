//! Standard scaling fitted once on the bulk table and reused for scoring

use ndarray::{Array1, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::error::PrepError;
use super::matrix::FeatureMatrix;

/// Per-column mean and population standard deviation.
///
/// Columns with zero deviation are divided by 1.0, so constant features
/// become all zeros instead of NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self, PrepError> {
        let values = matrix.values();
        let means = values.mean_axis(Axis(0)).ok_or(PrepError::EmptyTable)?;
        let scales = values
            .std_axis(Axis(0), 0.0)
            .mapv(|std| if std == 0.0 { 1.0 } else { std });

        Ok(Self {
            means: means.to_vec(),
            scales: scales.to_vec(),
        })
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    fn check_width(&self, actual: usize) -> Result<(), PrepError> {
        if actual != self.width() {
            return Err(PrepError::WidthMismatch {
                expected: self.width(),
                actual,
            });
        }
        Ok(())
    }

    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>, PrepError> {
        self.check_width(row.len())?;
        let means = ArrayView1::from(&self.means[..]);
        let scales = ArrayView1::from(&self.scales[..]);
        Ok((&row - &means) / &scales)
    }

    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, PrepError> {
        self.check_width(matrix.n_cols())?;
        let means = ArrayView1::from(&self.means[..]);
        let scales = ArrayView1::from(&self.scales[..]);
        let scaled = (matrix.values() - &means) / &scales;
        FeatureMatrix::new(matrix.columns().to_vec(), scaled)
    }
}
