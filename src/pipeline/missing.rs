//! Missing-value analysis, imputation and the post-imputation integrity gate

use polars::prelude::*;

use super::error::PrepError;
use super::loader::column_names;

/// Values used to fill each column during one imputation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputeOutcome {
    /// Mean of the non-null values of every numeric column that has one
    pub means: Vec<(String, f64)>,
    /// Number of cells filled per column (columns with no nulls are omitted)
    pub filled: Vec<(String, usize)>,
}

impl ImputeOutcome {
    pub fn mean(&self, column: &str) -> Option<f64> {
        self.means
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, m)| *m)
    }
}

/// Per-column missing ratio, sorted descending
pub fn analyze_missing_values(df: &DataFrame) -> Vec<(String, f64)> {
    let height = df.height();
    if height == 0 {
        return Vec::new();
    }

    let mut ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|column| {
            (
                column.name().to_string(),
                column.null_count() as f64 / height as f64,
            )
        })
        .collect();

    ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ratios
}

/// Rows in which at least one cell holds a value
pub fn non_empty_rows(df: &DataFrame) -> BooleanChunked {
    let mut keep = BooleanChunked::full("non_empty".into(), false, df.height());
    for column in df.get_columns() {
        keep = &keep | &column.as_materialized_series().is_not_null();
    }
    keep
}

/// Remove rows in which every cell is null.
///
/// Returns the remaining frame and, for each remaining row, its index in the
/// input so diagnostics can point back at the original record.
pub fn drop_empty_rows(df: &DataFrame) -> PolarsResult<(DataFrame, Vec<usize>)> {
    let keep = non_empty_rows(df);
    let source_rows = (&keep)
        .into_iter()
        .enumerate()
        .filter_map(|(row, kept)| (kept == Some(true)).then_some(row))
        .collect();
    Ok((df.filter(&keep)?, source_rows))
}

/// Fill text nulls with `placeholder` and numeric nulls with the column mean.
///
/// Means are computed from the already-cleaned values. A numeric column with
/// no values at all keeps its nulls and is caught by [`ensure_no_nulls`].
/// Running this twice leaves the frame unchanged after the first pass.
pub fn impute(df: &mut DataFrame, placeholder: &str) -> PolarsResult<ImputeOutcome> {
    let mut outcome = ImputeOutcome::default();
    let mut fills: Vec<Expr> = Vec::new();

    for column in df.get_columns() {
        let name = column.name().as_str();
        let nulls = column.null_count();

        let fill = match column.dtype() {
            DataType::String => col(name).fill_null(lit(placeholder)),
            dtype if dtype.is_primitive_numeric() => {
                let Some(mean) = column.as_materialized_series().mean() else {
                    continue;
                };
                outcome.means.push((name.to_string(), mean));
                col(name).cast(DataType::Float64).fill_null(lit(mean))
            }
            _ => continue,
        };

        if nulls > 0 {
            outcome.filled.push((name.to_string(), nulls));
            fills.push(fill);
        }
    }

    if !fills.is_empty() {
        *df = df.clone().lazy().with_columns(fills).collect()?;
    }
    Ok(outcome)
}

/// Fail if any cell in the frame is still null.
///
/// Rows are reported by position in `df`.
pub fn ensure_no_nulls(df: &DataFrame) -> Result<(), PrepError> {
    let columns = null_columns(df);
    if columns.is_empty() {
        return Ok(());
    }

    let mut any_null = BooleanChunked::full("null_rows".into(), false, df.height());
    for name in &columns {
        any_null = &any_null | &df.column(name)?.as_materialized_series().is_null();
    }
    let rows = (&any_null)
        .into_iter()
        .enumerate()
        .filter_map(|(row, null)| (null == Some(true)).then_some(row))
        .collect();

    Err(PrepError::NullResidue { columns, rows })
}

/// Names of the columns that still hold nulls
pub fn null_columns(df: &DataFrame) -> Vec<String> {
    column_names(df)
        .into_iter()
        .filter(|name| df.column(name).is_ok_and(|c| c.null_count() > 0))
        .collect()
}
