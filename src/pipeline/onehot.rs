//! One-hot expansion of text columns left over after schema encoding

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Categories observed for one expanded column, in indicator order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotColumn {
    pub source: String,
    pub categories: Vec<String>,
}

impl OneHotColumn {
    /// Names of the indicator columns, `<source>_<category>`
    pub fn indicator_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| indicator_name(&self.source, c))
            .collect()
    }

    /// Indicator values for one cell. Unseen or missing values are all zeros.
    pub fn encode(&self, value: Option<&str>) -> Vec<f64> {
        self.categories
            .iter()
            .map(|c| if Some(c.as_str()) == value { 1.0 } else { 0.0 })
            .collect()
    }
}

pub fn indicator_name(source: &str, category: &str) -> String {
    format!("{}_{}", source, category)
}

/// Replace every text column not in `exclude` by Float64 indicator columns.
///
/// Indicators are sorted by category so the same input always yields the
/// same column set and order. They are appended after the remaining columns,
/// in the order their source columns appeared.
pub fn one_hot_encode(df: &mut DataFrame, exclude: &[&str]) -> PolarsResult<Vec<OneHotColumn>> {
    let sources: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String && !exclude.contains(&c.name().as_str()))
        .map(|c| c.name().to_string())
        .collect();

    let mut layout = Vec::with_capacity(sources.len());

    for source in sources {
        let column = df.drop_in_place(&source)?;
        let dummies = column
            .as_materialized_series()
            .to_dummies(Some("_"), false)?;

        let prefix = format!("{}_", source);
        let mut indicators: Vec<(String, Column)> = Vec::with_capacity(dummies.width());
        for dummy in dummies.get_columns() {
            let name = dummy.name().as_str();
            let category = name.strip_prefix(&prefix).unwrap_or(name).to_string();
            indicators.push((category, dummy.cast(&DataType::Float64)?));
        }
        indicators.sort_by(|a, b| a.0.cmp(&b.0));

        let (categories, columns): (Vec<String>, Vec<Column>) = indicators.into_iter().unzip();
        df.hstack_mut(&columns)?;
        layout.push(OneHotColumn { source, categories });
    }

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::loader::column_names;

    fn values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_expands_sorted_categories_at_end() {
        let mut df = df! {
            "SUCURSAL" => ["Zona 10", "Centro", "Zona 10"],
            "SUELDO" => [1.0, 2.0, 3.0],
        }
        .unwrap();

        let layout = one_hot_encode(&mut df, &[]).unwrap();

        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].categories, vec!["Centro", "Zona 10"]);
        assert_eq!(
            column_names(&df),
            vec!["SUELDO", "SUCURSAL_Centro", "SUCURSAL_Zona 10"]
        );
        assert_eq!(values(&df, "SUCURSAL_Centro"), vec![Some(0.0), Some(1.0), Some(0.0)]);
        assert_eq!(layout[0].indicator_names(), column_names(&df)[1..].to_vec());
    }

    #[test]
    fn test_excluded_columns_are_left_alone() {
        let mut df = df! { "CLIENTE" => ["Ana", "Luis"] }.unwrap();

        let layout = one_hot_encode(&mut df, &["CLIENTE"]).unwrap();

        assert!(layout.is_empty());
        assert_eq!(column_names(&df), vec!["CLIENTE"]);
    }

    #[test]
    fn test_repeat_runs_give_identical_layout() {
        let build = || df! { "canal" => ["web", "agencia", "telefono", "web"] }.unwrap();
        let mut a = build();
        let mut b = build();
        assert_eq!(
            one_hot_encode(&mut a, &[]).unwrap(),
            one_hot_encode(&mut b, &[]).unwrap()
        );
        assert_eq!(column_names(&a), column_names(&b));
        assert_eq!(column_names(&a), vec!["canal_agencia", "canal_telefono", "canal_web"]);
    }

    #[test]
    fn test_encode_unseen_value_is_all_zero() {
        let column = OneHotColumn {
            source: "canal".to_string(),
            categories: vec!["agencia".to_string(), "web".to_string()],
        };
        assert_eq!(column.encode(Some("web")), vec![0.0, 1.0]);
        assert_eq!(column.encode(Some("fax")), vec![0.0, 0.0]);
        assert_eq!(column.encode(None), vec![0.0, 0.0]);
    }
}
