//! Per-group profile of a prepared table
//!
//! Groups come from a column added after preparation, either cluster labels
//! from a segmentation backend or the `FIT` label. Statistics are taken from
//! the unscaled cleaned values so amounts read back in currency units.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Table};
use console::style;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::{as_numeric, column_names, PrepError};
use crate::schema::{ColumnRole, ColumnSpec, Schema};
use crate::utils::{format_currency, format_percent, format_thousands};

const GROUP_KEY: &str = "__group";
const GROUP_COUNT: &str = "__count";

/// Spread of one monetary column within a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmountStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group: String,
    pub count: usize,
    pub amounts: Vec<(String, AmountStats)>,
    pub means: Vec<(String, f64)>,
    /// Share of rows with the flag set
    pub flag_shares: Vec<(String, f64)>,
    /// Share of rows per category label
    pub distributions: Vec<(String, Vec<(String, f64)>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupProfile {
    pub group_column: String,
    pub currency_symbol: String,
    pub groups: Vec<GroupStats>,
}

/// A schema column taking part in the profile, with the codes seen in it
struct Profiled<'a> {
    spec: &'a ColumnSpec,
    codes: Vec<f64>,
}

impl Profiled<'_> {
    /// Aggregations for this column, aliased `<index>:<stat>`
    fn aggregations(&self, index: usize) -> Vec<Expr> {
        let value = col(self.spec.name.as_str());
        let alias = |stat: &str| format!("{}:{}", index, stat);
        match &self.spec.role {
            ColumnRole::Currency => vec![
                value.clone().min().alias(alias("min")),
                value.clone().max().alias(alias("max")),
                value.clone().mean().alias(alias("mean")),
                value.median().alias(alias("median")),
            ],
            ColumnRole::Numeric => vec![value.mean().alias(alias("mean"))],
            ColumnRole::Flag { .. } => vec![value
                .eq(lit(1.0))
                .cast(DataType::Float64)
                .mean()
                .alias(alias("share"))],
            ColumnRole::Categorical { .. } => self
                .codes
                .iter()
                .enumerate()
                .map(|(k, code)| {
                    value
                        .clone()
                        .eq(lit(*code))
                        .cast(DataType::Float64)
                        .mean()
                        .alias(alias(&k.to_string()))
                })
                .collect(),
            ColumnRole::Identifier | ColumnRole::Ordinal { .. } | ColumnRole::Target { .. } => {
                Vec::new()
            }
        }
    }

    /// Read this column's aggregates for one group row into `stats`
    fn collect(
        &self,
        grouped: &DataFrame,
        index: usize,
        row: usize,
        stats: &mut GroupStats,
    ) -> PolarsResult<()> {
        let stat = |name: &str| -> PolarsResult<Option<f64>> {
            Ok(grouped
                .column(&format!("{}:{}", index, name))?
                .f64()?
                .get(row))
        };
        let name = self.spec.name.clone();

        match &self.spec.role {
            ColumnRole::Currency => {
                if let (Some(min), Some(max), Some(mean), Some(median)) =
                    (stat("min")?, stat("max")?, stat("mean")?, stat("median")?)
                {
                    stats.amounts.push((name, AmountStats { min, max, mean, median }));
                }
            }
            ColumnRole::Numeric => {
                if let Some(mean) = stat("mean")? {
                    stats.means.push((name, mean));
                }
            }
            ColumnRole::Flag { .. } => {
                if let Some(share) = stat("share")? {
                    stats.flag_shares.push((name, share));
                }
            }
            ColumnRole::Categorical { mapping } => {
                let mut shares = Vec::new();
                for (k, code) in self.codes.iter().enumerate() {
                    let Some(share) = stat(&k.to_string())?.filter(|s| *s > 0.0) else {
                        continue;
                    };
                    let label = if code.fract() == 0.0 {
                        mapping.literal_for(*code as i64).map(str::to_string)
                    } else {
                        None
                    };
                    shares.push((label.unwrap_or_else(|| format_thousands(*code, 2)), share));
                }
                if !shares.is_empty() {
                    stats.distributions.push((name, shares));
                }
            }
            ColumnRole::Identifier | ColumnRole::Ordinal { .. } | ColumnRole::Target { .. } => {}
        }
        Ok(())
    }
}

impl GroupProfile {
    /// Profile `table` split by the values of `group_column`.
    ///
    /// Rows with a null group are left out. Schema columns absent from the
    /// table, or holding non-numeric text, are skipped. Shares and statistics
    /// are taken over the present values of each column within the group.
    pub fn build(table: &DataFrame, group_column: &str, schema: &Schema) -> Result<Self, PrepError> {
        let groups_col = table
            .column(group_column)
            .map_err(|_| PrepError::SchemaMismatch {
                missing: vec![group_column.to_string()],
                available: column_names(table),
            })?;

        let mut columns = vec![group_keys(groups_col)?];
        let mut profiled = Vec::new();
        for spec in &schema.columns {
            if spec.name == group_column {
                continue;
            }
            let Ok(column) = table.column(&spec.name) else {
                continue;
            };
            let Some(numeric) = as_numeric(column)? else {
                continue;
            };
            let codes = match spec.role {
                ColumnRole::Categorical { .. } => distinct_values(&numeric)?,
                _ => Vec::new(),
            };
            columns.push(numeric);
            profiled.push(Profiled { spec, codes });
        }

        let mut aggregations = vec![len().alias(GROUP_COUNT)];
        for (index, column) in profiled.iter().enumerate() {
            aggregations.extend(column.aggregations(index));
        }

        let grouped = DataFrame::new(columns)?
            .lazy()
            .filter(col(GROUP_KEY).is_not_null())
            .group_by([col(GROUP_KEY)])
            .agg(aggregations)
            .collect()?;

        let keys = grouped.column(GROUP_KEY)?.str()?;
        let counts = grouped.column(GROUP_COUNT)?.cast(&DataType::UInt64)?;
        let counts = counts.u64()?;

        let mut groups = Vec::with_capacity(grouped.height());
        for row in 0..grouped.height() {
            let mut stats = GroupStats {
                group: keys.get(row).unwrap_or_default().to_string(),
                count: counts.get(row).unwrap_or_default() as usize,
                amounts: Vec::new(),
                means: Vec::new(),
                flag_shares: Vec::new(),
                distributions: Vec::new(),
            };
            for (index, column) in profiled.iter().enumerate() {
                column.collect(&grouped, index, row, &mut stats)?;
            }
            groups.push(stats);
        }

        groups.sort_by(|a, b| match (a.group.parse::<f64>(), b.group.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.total_cmp(&y),
            _ => a.group.cmp(&b.group),
        });

        Ok(Self {
            group_column: group_column.to_string(),
            currency_symbol: schema.currency_symbol.clone(),
            groups,
        })
    }

    pub fn group(&self, key: &str) -> Option<&GroupStats> {
        self.groups.iter().find(|g| g.group == key)
    }

    /// One table per group, as plain text
    pub fn render(&self) -> String {
        let mut out = String::new();
        for stats in &self.groups {
            out.push_str(&format!("{} {}\n", self.group_column, stats.group));

            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_header(vec![
                Cell::new("Metric").add_attribute(Attribute::Bold),
                Cell::new("Value").add_attribute(Attribute::Bold),
            ]);
            table.add_row(vec![Cell::new("Clients"), right(stats.count.to_string())]);

            for (name, amount) in &stats.amounts {
                for (label, value) in [
                    ("min", amount.min),
                    ("max", amount.max),
                    ("mean", amount.mean),
                    ("median", amount.median),
                ] {
                    table.add_row(vec![
                        Cell::new(format!("{} ({})", name, label)),
                        right(format_currency(value, &self.currency_symbol)),
                    ]);
                }
            }
            for (name, mean) in &stats.means {
                table.add_row(vec![
                    Cell::new(format!("{} (mean)", name)),
                    right(format!("{:.2}", mean)),
                ]);
            }
            for (name, ratio) in &stats.flag_shares {
                table.add_row(vec![Cell::new(format!("% {}", name)), right(format_percent(*ratio))]);
            }
            for (name, shares) in &stats.distributions {
                for (label, ratio) in shares {
                    table.add_row(vec![
                        Cell::new(format!("{}: {}", name, label)),
                        right(format_percent(*ratio)),
                    ]);
                }
            }

            out.push_str(&table.to_string());
            out.push_str("\n\n");
        }
        out
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("👥").cyan(),
            style(format!("GROUP PROFILE BY {}", self.group_column)).white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();
        for line in self.render().lines() {
            println!("    {}", line);
        }
    }
}

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Group labels as text; integral numbers read as `1`, not `1.0`
fn group_keys(column: &Column) -> PolarsResult<Column> {
    let keys: Vec<Option<String>> = match as_numeric(column)? {
        Some(numeric) => numeric
            .f64()?
            .into_iter()
            .map(|v| {
                v.map(|v| {
                    if v.fract() == 0.0 {
                        format!("{}", v as i64)
                    } else {
                        v.to_string()
                    }
                })
            })
            .collect(),
        None => column
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.trim().to_string()))
            .collect(),
    };
    Ok(Column::new(GROUP_KEY.into(), keys))
}

fn distinct_values(column: &Column) -> PolarsResult<Vec<f64>> {
    let mut values: Vec<f64> = column.f64()?.into_iter().flatten().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();
    Ok(values)
}
