//! Seam to the model backends that consume prepared features
//!
//! No clustering or ensemble model ships with this crate. Callers plug one in
//! through these traits; the scoring helpers guarantee that a new record goes
//! through the same fitted transformation as the bulk table.

use std::collections::BTreeMap;

use anyhow::Result;
use ndarray::{ArrayView1, Axis};

use super::matrix::FeatureMatrix;
use super::state::FittedState;

/// Unsupervised segmentation (e.g. k-means over scaled features)
pub trait SegmentationBackend {
    /// Fit on the whole matrix and return one cluster per row
    fn fit_predict(&mut self, features: &FeatureMatrix) -> Result<Vec<usize>>;

    /// Cluster for one model-ready row
    fn predict(&self, row: ArrayView1<'_, f64>) -> Result<usize>;
}

/// Supervised fitness classifier (e.g. a random forest)
pub trait ClassifierBackend {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[u8]) -> Result<()>;

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>>;
}

/// Cluster for a single already-encoded record
pub fn score_segment<B: SegmentationBackend + ?Sized>(
    state: &FittedState,
    record: &BTreeMap<String, f64>,
    backend: &B,
) -> Result<usize> {
    let row = state.transform_record(record)?;
    backend.predict(row.view())
}

/// Fitness prediction for a single already-encoded record
pub fn score_fitness<B: ClassifierBackend + ?Sized>(
    state: &FittedState,
    record: &BTreeMap<String, f64>,
    backend: &B,
) -> Result<u8> {
    let row = state.transform_record(record)?;
    let matrix = FeatureMatrix::new(state.feature_columns.clone(), row.insert_axis(Axis(0)))?;
    let predictions = backend.predict(&matrix)?;
    predictions
        .first()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Classifier returned no prediction for the record"))
}
