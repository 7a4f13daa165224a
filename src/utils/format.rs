//! Number formatting for console reports

/// Fixed-point with `,` thousands separators: `66908.0` → `"66,908.00"`
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Monetary figure with the currency symbol prefixed: `"Q66,908.00"`
pub fn format_currency(value: f64, symbol: &str) -> String {
    format!("{}{}", symbol, format_thousands(value, 2))
}

/// Ratio in `[0, 1]` as a percentage with one decimal: `0.25` → `"25.0%"`
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(66908.0, 2), "66,908.00");
        assert_eq!(format_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_thousands(999.0, 2), "999.00");
        assert_eq!(format_thousands(1000.0, 0), "1,000");
        assert_eq!(format_thousands(-1500.5, 1), "-1,500.5");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(150000.0, "Q"), "Q150,000.00");
        assert_eq!(format_currency(0.5, "Q"), "Q0.50");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.25), "25.0%");
        assert_eq!(format_percent(1.0 / 3.0), "33.3%");
    }

    #[test]
    fn test_non_finite_passthrough() {
        assert_eq!(format_thousands(f64::NAN, 2), "NaN");
    }
}
