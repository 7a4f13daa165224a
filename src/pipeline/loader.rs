//! Record loader for CSV and Parquet files
//!
//! CSV cells are loaded as raw text: currency amounts such as `"Q 66.908,00"`
//! must reach the currency normalizer untouched, so CSV schema inference is
//! disabled. Columns that arrive typed (Parquet) keep numeric values as
//! Float64 and everything else is read as text. Headers are trimmed and
//! renamed to their canonical schema names.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use super::error::PrepError;
use crate::schema::Schema;

/// Options for reading delimited input
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field separator for CSV input
    pub separator: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { separator: b',' }
    }
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn scan(path: &Path, options: &LoadOptions) -> Result<LazyFrame> {
    let extension = file_extension(path);

    let lf = match extension.as_str() {
        "csv" | "txt" | "tsv" => LazyCsvReader::new(path)
            .with_separator(options.separator)
            .with_has_header(true)
            // Zero inference rows: every column is read as String
            .with_infer_schema_length(Some(0))
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    Ok(lf)
}

/// Header names as they appear in the file, before normalization
pub fn get_raw_column_names(path: &Path, options: &LoadOptions) -> Result<Vec<String>> {
    let mut lf = scan(path, options)?;
    let schema = lf
        .collect_schema()
        .with_context(|| format!("Failed to read header of {}", path.display()))?;
    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

/// Header names after trimming and alias resolution
pub fn get_column_names(path: &Path, schema: &Schema, options: &LoadOptions) -> Result<Vec<String>> {
    Ok(get_raw_column_names(path, options)?
        .iter()
        .map(|name| schema.canonical_name(name))
        .collect())
}

/// Load a file into a DataFrame with canonical headers
pub fn load_table(path: &Path, schema: &Schema, options: &LoadOptions) -> Result<DataFrame> {
    let df = scan(path, options)?
        .collect()
        .with_context(|| format!("Failed to read {}", path.display()))?;
    normalize_frame(df, schema)
}

/// Rename headers to their canonical names and settle column types.
///
/// Text cells that are empty or whitespace-only become null. Numeric columns
/// are cast to Float64; any other type is read as text.
pub fn normalize_frame(mut df: DataFrame, schema: &Schema) -> Result<DataFrame> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(df.width());
    for name in df.get_column_names() {
        let canonical = schema.canonical_name(name.as_str());
        if !seen.insert(canonical.clone()) {
            return Err(PrepError::DuplicateColumn(canonical).into());
        }
        names.push(canonical);
    }
    df.set_column_names(names.iter().map(String::as_str))?;

    let exprs: Vec<Expr> = df
        .get_columns()
        .iter()
        .map(|column| {
            let name = column.name().as_str();
            match column.dtype() {
                DataType::String => blank_to_null(col(name), name),
                dtype if dtype.is_primitive_numeric() => col(name).cast(DataType::Float64),
                _ => blank_to_null(col(name).cast(DataType::String), name),
            }
        })
        .collect();

    df.lazy()
        .with_columns(exprs)
        .collect()
        .context("Failed to normalize loaded columns")
}

fn blank_to_null(value: Expr, name: &str) -> Expr {
    when(value.clone().str().strip_chars(lit(NULL)).eq(lit("")))
        .then(lit(NULL).cast(DataType::String))
        .otherwise(value)
        .alias(name)
}

/// Column names as owned strings, in frame order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

/// Float64 view of a column when every present value is numeric.
///
/// Numeric columns are cast directly. Text columns qualify only if the cast
/// does not turn any present value into null.
pub fn as_numeric(column: &Column) -> PolarsResult<Option<Column>> {
    match column.dtype() {
        dtype if dtype.is_primitive_numeric() => Ok(Some(column.cast(&DataType::Float64)?)),
        DataType::String => {
            let cast = column.cast(&DataType::Float64)?;
            Ok((cast.null_count() == column.null_count()).then_some(cast))
        }
        _ => Ok(None),
    }
}

/// Fail unless every name in `required` is present in the frame
pub fn check_required_columns(df: &DataFrame, required: &[&str]) -> Result<(), PrepError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| df.column(name).is_err())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PrepError::SchemaMismatch {
            missing,
            available: column_names(df),
        })
    }
}
