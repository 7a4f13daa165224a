//! JSON export of one preparation run

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{CoercedCell, ColumnTally, Prepared};

/// Metadata about the preparation run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the export (ISO 8601 format)
    pub timestamp: String,
    pub credprep_version: String,
    pub input_file: String,
    pub schema: String,
    pub variant: String,
    pub strict: bool,
}

#[derive(Serialize)]
pub struct RunCounts {
    pub rows_loaded: usize,
    pub dropped_empty_rows: usize,
    pub rows_prepared: usize,
    pub feature_count: usize,
    pub total_missing: usize,
    pub total_coerced: usize,
    pub total_imputed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_rows: Option<usize>,
}

#[derive(Serialize)]
pub struct ImputationEntry {
    pub column: String,
    pub mean: f64,
}

/// Complete preparation report
#[derive(Serialize)]
pub struct PreparationReport {
    pub metadata: RunMetadata,
    pub counts: RunCounts,
    pub feature_columns: Vec<String>,
    pub ignored_columns: Vec<String>,
    pub tallies: Vec<ColumnTally>,
    /// Unreadable cells in row order, capped at [`MAX_REPORTED_CELLS`]
    pub coerced_cells: Vec<CoercedCell>,
    pub imputation_means: Vec<ImputationEntry>,
    pub placeholder: String,
}

pub const MAX_REPORTED_CELLS: usize = 500;

pub struct ReportParams<'a> {
    pub input_file: &'a str,
    pub strict: bool,
}

impl PreparationReport {
    pub fn from_prepared(prepared: &Prepared, params: &ReportParams) -> Self {
        let ledger = &prepared.ledger;
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                credprep_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: params.input_file.to_string(),
                schema: prepared.state.schema.clone(),
                variant: prepared.state.variant.to_string(),
                strict: params.strict,
            },
            counts: RunCounts {
                rows_loaded: prepared.rows_loaded,
                dropped_empty_rows: prepared.dropped_empty_rows,
                rows_prepared: prepared.features.n_rows(),
                feature_count: prepared.features.n_cols(),
                total_missing: ledger.total_missing(),
                total_coerced: ledger.total_coerced(),
                total_imputed: ledger.total_imputed(),
                fit_rows: prepared
                    .labels
                    .as_ref()
                    .map(|labels| labels.iter().filter(|l| **l == 1).count()),
            },
            feature_columns: prepared.state.feature_columns.clone(),
            ignored_columns: prepared.ignored_columns.clone(),
            tallies: ledger.tallies().to_vec(),
            coerced_cells: ledger
                .coerced_cells()
                .iter()
                .take(MAX_REPORTED_CELLS)
                .cloned()
                .collect(),
            imputation_means: prepared
                .imputation
                .means
                .iter()
                .map(|(column, mean)| ImputationEntry {
                    column: column.clone(),
                    mean: *mean,
                })
                .collect(),
            placeholder: prepared.state.placeholder.clone(),
        }
    }
}

/// Write the report as pretty-printed JSON
pub fn export_report(report: &PreparationReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize preparation report")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
    Ok(())
}
