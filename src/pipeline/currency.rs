//! Currency normalization for `"Q 66.908,00"` style amounts

/// Parse a currency-formatted string into a float.
///
/// `.` is a thousands separator and `,` the decimal separator. The only
/// exception is a value without any `,` whose single `.` is followed by
/// exactly two digits (`"Q 150.00"`), which reads as a decimal point.
///
/// Anything unparseable (empty, `"N/A"`, several decimal commas, non-finite)
/// comes back as `None` so it can be imputed downstream. Signed and exponent
/// forms such as `"+5"` or `"1e5"` are numbers to `f64::from_str` and parse.
pub fn clean_currency(raw: Option<&str>, symbol: &str) -> Option<f64> {
    let raw = raw?;
    let stripped = if symbol.is_empty() {
        raw.to_string()
    } else {
        raw.replace(symbol, "")
    };
    let value = stripped.trim();
    if value.is_empty() {
        return None;
    }

    let normalized = if !value.contains(',') && has_two_digit_decimal(value) {
        value.to_string()
    } else {
        value.replace('.', "").replace(',', ".")
    };

    let parsed = normalized.parse::<f64>().ok()?;
    parsed.is_finite().then_some(parsed)
}

fn has_two_digit_decimal(value: &str) -> bool {
    let mut parts = value.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(fraction), None) => {
            fraction.len() == 2 && fraction.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: Option<f64>, expected: f64) {
        let v = actual.unwrap_or_else(|| panic!("expected {}, got None", expected));
        assert!((v - expected).abs() < 1e-9, "expected {}, got {}", expected, v);
    }

    #[test]
    fn test_thousands_and_decimal_comma() {
        approx(clean_currency(Some("Q 66.908,00"), "Q"), 66908.0);
    }

    #[test]
    fn test_two_digit_point_is_decimal() {
        approx(clean_currency(Some("Q 150.00"), "Q"), 150.0);
    }

    #[test]
    fn test_without_symbol() {
        approx(clean_currency(Some("  1.250,50 "), "Q"), 1250.5);
    }

    #[test]
    fn test_multiple_thousand_groups() {
        approx(clean_currency(Some("Q1.234.567,89"), "Q"), 1234567.89);
        approx(clean_currency(Some("Q 66.908"), "Q"), 66908.0);
    }

    #[test]
    fn test_plain_integer() {
        approx(clean_currency(Some("150000"), "Q"), 150000.0);
    }

    #[test]
    fn test_sign_and_exponent_forms() {
        approx(clean_currency(Some("1e5"), "Q"), 100000.0);
        approx(clean_currency(Some("Q +5"), "Q"), 5.0);
        approx(clean_currency(Some("-2.500,00"), "Q"), -2500.0);
    }

    #[test]
    fn test_symbol_as_suffix() {
        approx(clean_currency(Some("3.500,00 Q"), "Q"), 3500.0);
    }

    #[test]
    fn test_malformed_values_are_none() {
        assert_eq!(clean_currency(Some("N/A"), "Q"), None);
        assert_eq!(clean_currency(Some("Q"), "Q"), None);
        assert_eq!(clean_currency(Some(""), "Q"), None);
        assert_eq!(clean_currency(Some("1,2,3"), "Q"), None);
        assert_eq!(clean_currency(Some("NaN"), "Q"), None);
        assert_eq!(clean_currency(None, "Q"), None);
    }
}
