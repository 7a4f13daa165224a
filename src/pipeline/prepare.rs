//! Preparation pipeline: raw record table in, model-ready features out
//!
//! Stage order is fixed:
//! required columns → drop empty rows → currency → trim → map → flags →
//! numeric coercion → (classification) fitness label → impute → null gate →
//! (classification) one-hot → feature matrix → (segmentation) scaling.

use std::collections::BTreeMap;

use polars::prelude::*;

use super::currency::clean_currency;
use super::encode::{coerce_numeric, encode_flag, fitness_label, map_category, trim_category};
use super::error::PrepError;
use super::ledger::CoercionLedger;
use super::loader::{as_numeric, check_required_columns, column_names};
use super::matrix::FeatureMatrix;
use super::missing::{drop_empty_rows, ensure_no_nulls, impute, ImputeOutcome};
use super::onehot::one_hot_encode;
use super::scale::StandardScaler;
use super::state::{FittedState, Variant};
use crate::schema::{ColumnRole, ColumnSpec, Schema};

/// Name of the derived binary label column
pub const FIT_COLUMN: &str = "FIT";

/// Everything produced by one preparation run
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Cleaned, imputed, unscaled table (features plus `FIT` for classification)
    pub cleaned: DataFrame,
    /// Unscaled feature matrix in fitted column order
    pub features: FeatureMatrix,
    /// What the backend receives: scaled for segmentation, `features` otherwise
    pub model_input: FeatureMatrix,
    pub labels: Option<Vec<u8>>,
    pub state: FittedState,
    pub ledger: CoercionLedger,
    pub imputation: ImputeOutcome,
    pub rows_loaded: usize,
    pub dropped_empty_rows: usize,
    /// Input row index of every row in `cleaned`
    pub source_rows: Vec<usize>,
    /// Input columns that did not take part in this variant
    pub ignored_columns: Vec<String>,
}

/// Configured preparation run for one schema and variant
#[derive(Debug, Clone)]
pub struct Preparer {
    schema: Schema,
    variant: Variant,
    strict: bool,
}

impl Preparer {
    pub fn new(schema: Schema, variant: Variant) -> Self {
        Self {
            schema,
            variant,
            strict: false,
        }
    }

    /// Fail on any present value that cannot be parsed or mapped
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Columns the input must contain for this variant
    pub fn required_columns(&self) -> Vec<&str> {
        let mut required: Vec<&str> = self
            .schema
            .feature_columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        if self.variant == Variant::Classification {
            if let Some(target) = self.schema.target() {
                required.push(target.name.as_str());
            }
        }
        required
    }

    pub fn prepare(&self, table: DataFrame) -> Result<Prepared, PrepError> {
        check_required_columns(&table, &self.required_columns())?;

        let rows_loaded = table.height();
        let (mut table, source_rows) = drop_empty_rows(&table)?;
        let dropped_empty_rows = rows_loaded - table.height();
        if table.height() == 0 {
            return Err(PrepError::EmptyTable);
        }

        let mut ledger = CoercionLedger::new();
        let ignored_columns = self.drop_unused_columns(&mut table)?;

        for spec in self.schema.feature_columns() {
            let Ok(column) = table.column(&spec.name) else {
                continue;
            };
            let encoded = encode_column(
                spec,
                column,
                &self.schema.currency_symbol,
                &source_rows,
                &mut ledger,
            )?;
            table.replace(&spec.name, encoded)?;
        }

        let labels = match self.variant {
            Variant::Classification => Some(self.derive_labels(&mut table, &source_rows, &mut ledger)?),
            Variant::Segmentation => None,
        };

        if self.strict && !ledger.coerced_cells().is_empty() {
            return Err(PrepError::CoercedValues {
                cells: ledger.coerced_cells().to_vec(),
            });
        }

        let imputation = impute(&mut table, &self.schema.placeholder)?;
        for (column, count) in &imputation.filled {
            ledger.record_imputed(column, *count);
        }
        ensure_no_nulls(&table).map_err(|err| match err {
            PrepError::NullResidue { columns, rows } => PrepError::NullResidue {
                columns,
                rows: rows.into_iter().map(|row| source_rows[row]).collect(),
            },
            other => other,
        })?;

        let one_hot = match self.variant {
            Variant::Classification => one_hot_encode(&mut table, &[])?,
            Variant::Segmentation => Vec::new(),
        };

        let feature_columns = column_names(&table);
        let features = FeatureMatrix::from_frame(&table, &feature_columns)?;

        let scaler = match self.variant {
            Variant::Segmentation => Some(StandardScaler::fit(&features)?),
            Variant::Classification => None,
        };
        let model_input = match &scaler {
            Some(scaler) => scaler.transform(&features)?,
            None => features.clone(),
        };

        let impute_means: BTreeMap<String, f64> = imputation
            .means
            .iter()
            .filter(|(name, _)| feature_columns.contains(name))
            .cloned()
            .collect();

        let state = FittedState {
            schema: self.schema.name.clone(),
            variant: self.variant,
            feature_columns,
            impute_means,
            placeholder: self.schema.placeholder.clone(),
            one_hot,
            scaler,
            label_column: labels.as_ref().map(|_| FIT_COLUMN.to_string()),
            created_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let mut cleaned = table;
        if let Some(labels) = &labels {
            let fit: Vec<f64> = labels.iter().map(|l| f64::from(*l)).collect();
            cleaned.with_column(Column::new(FIT_COLUMN.into(), fit))?;
        }

        Ok(Prepared {
            cleaned,
            features,
            model_input,
            labels,
            state,
            ledger,
            imputation,
            rows_loaded,
            dropped_empty_rows,
            source_rows,
            ignored_columns,
        })
    }

    /// Remove identifiers always; for segmentation also the target and any
    /// column outside the schema. Returns the non-identifier columns removed.
    fn drop_unused_columns(&self, table: &mut DataFrame) -> PolarsResult<Vec<String>> {
        let mut ignored = Vec::new();

        for name in column_names(table) {
            match self.schema.column(&name).map(|c| &c.role) {
                Some(ColumnRole::Identifier) => {
                    table.drop_in_place(&name)?;
                }
                Some(ColumnRole::Target { .. }) => {
                    if self.variant == Variant::Segmentation {
                        table.drop_in_place(&name)?;
                        ignored.push(name);
                    }
                }
                Some(_) => {}
                None => match self.variant {
                    Variant::Segmentation => {
                        table.drop_in_place(&name)?;
                        ignored.push(name);
                    }
                    Variant::Classification => {
                        let numeric = as_numeric(table.column(&name)?)?;
                        if let Some(numeric) = numeric {
                            table.replace(&name, numeric.as_materialized_series().clone())?;
                        }
                    }
                },
            }
        }

        Ok(ignored)
    }

    /// Take the target column out of the table and turn it into binary fitness labels
    fn derive_labels(
        &self,
        table: &mut DataFrame,
        source_rows: &[usize],
        ledger: &mut CoercionLedger,
    ) -> Result<Vec<u8>, PrepError> {
        let (name, max_fit) = match self.schema.target() {
            Some(ColumnSpec {
                name,
                role: ColumnRole::Target { max_fit },
                ..
            }) => (name, *max_fit),
            _ => {
                return Err(PrepError::InvalidSchema(
                    "classification requires a target column".to_string(),
                ))
            }
        };
        let column = table.drop_in_place(name)?;

        let pending = numeric_cells(name, &column, coerce_numeric, source_rows, ledger)?;
        Ok(pending
            .f64()?
            .into_iter()
            .map(|p| fitness_label(p, max_fit))
            .collect())
    }
}

/// Clean one schema feature column into numeric codes, recording coercions.
///
/// `source_rows` maps each row of `column` to its index in the loaded input.
fn encode_column(
    spec: &ColumnSpec,
    column: &Column,
    currency_symbol: &str,
    source_rows: &[usize],
    ledger: &mut CoercionLedger,
) -> PolarsResult<Series> {
    let name = spec.name.as_str();
    match &spec.role {
        ColumnRole::Currency => numeric_cells(
            name,
            column,
            |raw| clean_currency(raw, currency_symbol),
            source_rows,
            ledger,
        ),
        ColumnRole::Numeric => numeric_cells(name, column, coerce_numeric, source_rows, ledger),
        ColumnRole::Ordinal { mapping } | ColumnRole::Categorical { mapping } => {
            let text = column.cast(&DataType::String)?;
            let values: Vec<Option<f64>> = text
                .str()?
                .into_iter()
                .zip(source_rows)
                .map(|(raw, &row)| {
                    let value = if spec.trim {
                        trim_category(raw)
                    } else {
                        raw.map(str::to_string)
                    };
                    let code = map_category(value.as_deref(), mapping);
                    match (raw, code) {
                        (None, _) => ledger.record_missing(name),
                        (Some(raw), None) => ledger.record_coerced(name, row, raw),
                        (Some(_), Some(_)) => {}
                    }
                    code.map(|c| c as f64)
                })
                .collect();
            Ok(Series::new(name.into(), values))
        }
        ColumnRole::Flag { true_literal } => {
            ledger.record_missing_count(name, column.null_count());
            let text = column.cast(&DataType::String)?;
            let values: Vec<f64> = text
                .str()?
                .into_iter()
                .map(|raw| f64::from(encode_flag(raw, true_literal)))
                .collect();
            Ok(Series::new(name.into(), values))
        }
        ColumnRole::Identifier | ColumnRole::Target { .. } => {
            Ok(column.as_materialized_series().clone())
        }
    }
}

/// Parse text cells with `parse`. Numeric columns pass through as Float64.
fn numeric_cells<F>(
    name: &str,
    column: &Column,
    parse: F,
    source_rows: &[usize],
    ledger: &mut CoercionLedger,
) -> PolarsResult<Series>
where
    F: Fn(Option<&str>) -> Option<f64>,
{
    if column.dtype().is_primitive_numeric() {
        ledger.record_missing_count(name, column.null_count());
        return Ok(column
            .cast(&DataType::Float64)?
            .as_materialized_series()
            .clone());
    }

    let text = column.cast(&DataType::String)?;
    let values: Vec<Option<f64>> = text
        .str()?
        .into_iter()
        .zip(source_rows)
        .map(|(raw, &row)| {
            let parsed = parse(raw);
            match (raw, parsed) {
                (None, _) => ledger.record_missing(name),
                (Some(raw), None) => ledger.record_coerced(name, row, raw),
                (Some(_), Some(_)) => {}
            }
            parsed
        })
        .collect();
    Ok(Series::new(name.into(), values))
}
