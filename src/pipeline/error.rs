//! Typed errors raised by the preparation stages.
//!
//! Parse failures and unmapped categories never show up here: they are
//! recovered as nulls and routed through imputation. Only the integrity
//! gates (schema at load time, nulls after imputation, strict mode) and
//! scoring-time mismatches are fatal.

use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

/// A cell that held a value in the raw input but was coerced to null
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoercedCell {
    pub column: String,
    /// Zero-based row index in the loaded input, counting dropped empty rows
    pub row: usize,
    pub raw: String,
}

#[derive(Debug, Error)]
pub enum PrepError {
    /// One or more columns required by the schema are absent from the input.
    #[error("Missing expected column(s): {missing:?}. Available columns: {available:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// Two input headers normalize to the same canonical column name.
    #[error("Column '{0}' appears more than once after header normalization")]
    DuplicateColumn(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Nulls survived imputation. Carries every offending column and row.
    #[error("{}", render_null_residue(.columns, .rows))]
    NullResidue { columns: Vec<String>, rows: Vec<usize> },

    /// Strict mode only: present values that could not be parsed or mapped.
    #[error("{}", render_coerced(.cells))]
    CoercedValues { cells: Vec<CoercedCell> },

    /// A single record named a column the fitted state does not know.
    #[error("Column '{column}' is not part of the fitted feature set {expected:?}")]
    UnknownFeature {
        column: String,
        expected: Vec<String>,
    },

    /// A feature vector handed to the fitted state has the wrong width.
    #[error("Fitted state expects {expected} feature(s), got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    /// A feature column is still text when the numeric matrix is built.
    #[error("Feature column '{0}' is not numeric after encoding")]
    NonNumericFeature(String),

    #[error("No rows remain after dropping empty rows")]
    EmptyTable,

    #[error("Data frame operation failed: {0}")]
    Polars(#[from] PolarsError),
}

fn render_null_residue(columns: &[String], rows: &[usize]) -> String {
    let shown: Vec<String> = rows.iter().take(20).map(|r| r.to_string()).collect();
    let more = if rows.len() > shown.len() {
        format!(" (and {} more)", rows.len() - shown.len())
    } else {
        String::new()
    };
    format!(
        "Null values remain after imputation. Columns with null values: {:?}. Rows with null values: [{}]{}",
        columns,
        shown.join(", "),
        more
    )
}

fn render_coerced(cells: &[CoercedCell]) -> String {
    let mut out = format!(
        "{} value(s) could not be parsed or mapped and would be imputed:",
        cells.len()
    );
    for cell in cells.iter().take(20) {
        out.push_str(&format!(
            "\n  row {} column '{}': {:?}",
            cell.row, cell.column, cell.raw
        ));
    }
    if cells.len() > 20 {
        out.push_str(&format!("\n  ... and {} more", cells.len() - 20));
    }
    out
}
