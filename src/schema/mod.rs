//! Declarative column schema for loan/customer records
//!
//! The column set is fixed: every feature column, its header aliases and its
//! literal mapping table live in a JSON definition. The default definition is
//! embedded in the binary; `--schema` swaps in another file with the same shape.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::PrepError;

const DEFAULT_SCHEMA: &str = include_str!("../../schema/loan_records.json");

/// Ordered literal → code table. Keys match exactly and case-sensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMapping(Vec<(String, i64)>);

impl CategoryMapping {
    pub fn new(entries: Vec<(String, i64)>) -> Self {
        Self(entries)
    }

    /// Code for an exact literal, or `None` when the literal is not a key
    pub fn get(&self, literal: &str) -> Option<i64> {
        self.0
            .iter()
            .find(|(key, _)| key == literal)
            .map(|(_, code)| *code)
    }

    /// First literal mapped to `code`, used to label codes in reports
    pub fn literal_for(&self, code: i64) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(key, _)| key.as_str())
    }

    pub fn entries(&self) -> &[(String, i64)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How a column is cleaned and whether it reaches the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ColumnRole {
    /// Excluded from model input entirely
    Identifier,
    /// `"Q 66.908,00"` style amounts
    Currency,
    /// Coerced to float, non-numeric text becomes null
    Numeric,
    /// Ranked brackets (age, tenure)
    Ordinal { mapping: CategoryMapping },
    /// Unordered categories (occupation, marital status, purchase type)
    Categorical { mapping: CategoryMapping },
    /// 1 on exact match of the literal, 0 otherwise
    Flag { true_literal: String },
    /// Pending installments; fit when the value is at most `max_fit`
    Target { max_fit: f64 },
}

impl ColumnRole {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::Identifier => "identifier",
            ColumnRole::Currency => "currency",
            ColumnRole::Numeric => "numeric",
            ColumnRole::Ordinal { .. } => "ordinal",
            ColumnRole::Categorical { .. } => "categorical",
            ColumnRole::Flag { .. } => "flag",
            ColumnRole::Target { .. } => "target",
        }
    }

    pub fn mapping(&self) -> Option<&CategoryMapping> {
        match self {
            ColumnRole::Ordinal { mapping } | ColumnRole::Categorical { mapping } => Some(mapping),
            _ => None,
        }
    }

    pub fn is_feature(&self) -> bool {
        !matches!(self, ColumnRole::Identifier | ColumnRole::Target { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Canonical column name used after loading
    pub name: String,
    /// Header spellings renamed to `name` on load
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(flatten)]
    pub role: ColumnRole,
    /// Strip surrounding whitespace before mapping
    #[serde(default)]
    pub trim: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub currency_symbol: String,
    /// Fill value for text columns during imputation
    pub placeholder: String,
    pub columns: Vec<ColumnSpec>,
}

impl Schema {
    /// The embedded loan-records schema
    pub fn default_loan_records() -> Result<Self> {
        Self::from_json(DEFAULT_SCHEMA).context("Embedded schema definition is invalid")
    }

    /// Read a schema definition from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to parse schema file: {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let schema: Schema = serde_json::from_str(text)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Reject definitions that would make header normalization or mapping ambiguous
    pub fn validate(&self) -> Result<(), PrepError> {
        let invalid = |msg: String| Err(PrepError::InvalidSchema(msg));

        if self.columns.is_empty() {
            return invalid("schema defines no columns".to_string());
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for spec in &self.columns {
            for name in std::iter::once(&spec.name).chain(spec.aliases.iter()) {
                if !seen.insert(name.as_str()) {
                    return invalid(format!("header '{}' is declared more than once", name));
                }
            }

            if let Some(mapping) = spec.role.mapping() {
                if mapping.is_empty() {
                    return invalid(format!("column '{}' has an empty mapping", spec.name));
                }
                let mut keys: HashSet<&str> = HashSet::new();
                for (key, _) in mapping.entries() {
                    if !keys.insert(key.as_str()) {
                        return invalid(format!(
                            "column '{}' maps literal '{}' more than once",
                            spec.name, key
                        ));
                    }
                }
            }

            if let ColumnRole::Flag { true_literal } = &spec.role {
                if true_literal.is_empty() {
                    return invalid(format!("flag column '{}' has an empty literal", spec.name));
                }
            }
        }

        let targets = self
            .columns
            .iter()
            .filter(|c| matches!(c.role, ColumnRole::Target { .. }))
            .count();
        if targets > 1 {
            return invalid(format!("{} target columns declared, at most one allowed", targets));
        }

        if self.feature_columns().is_empty() {
            return invalid("schema defines no feature columns".to_string());
        }

        Ok(())
    }

    /// Canonical name for an input header; unknown headers come back unchanged
    pub fn canonical_name(&self, header: &str) -> String {
        let header = header.trim();
        self.columns
            .iter()
            .find(|c| c.name == header || c.aliases.iter().any(|a| a == header))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| header.to_string())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns that feed the model, in schema order
    pub fn feature_columns(&self) -> Vec<&ColumnSpec> {
        self.columns.iter().filter(|c| c.role.is_feature()).collect()
    }

    pub fn target(&self) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| matches!(c.role, ColumnRole::Target { .. }))
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}
