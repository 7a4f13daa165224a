//! Scalar encoders for categorical, flag, numeric and target cells

use crate::schema::CategoryMapping;

/// Strip leading and trailing whitespace; `None` passes through
pub fn trim_category(raw: Option<&str>) -> Option<String> {
    raw.map(|s| s.trim().to_string())
}

/// Exact, case-sensitive lookup. Values outside the mapping are `None`.
pub fn map_category(value: Option<&str>, mapping: &CategoryMapping) -> Option<i64> {
    value.and_then(|v| mapping.get(v))
}

/// 1 on an exact match of `true_literal`, 0 for anything else including null
pub fn encode_flag(value: Option<&str>, true_literal: &str) -> u8 {
    match value {
        Some(v) if v == true_literal => 1,
        _ => 0,
    }
}

/// Numeric coercion; text that is not a finite number becomes `None`.
///
/// Parsing follows `f64::from_str`, so `"+5"` and `"1e5"` are numbers.
pub fn coerce_numeric(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Fitness label: 1 when pending installments are at most `max_fit`.
///
/// A missing count compares false and yields 0.
pub fn fitness_label(pending: Option<f64>, max_fit: f64) -> u8 {
    match pending {
        Some(v) if v <= max_fit => 1,
        _ => 0,
    }
}
