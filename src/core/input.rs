//! Coercion applied where raw form values enter the engines.

/// NaN, infinities and negatives become zero.
pub fn coerce_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parses a form field such as `"£45,000.50"`. Anything unparseable is zero.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '£' | ',' | '_') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().map(coerce_amount).unwrap_or(0.0)
}

/// Allowance implied by an `L` tax code, e.g. `1257L` -> 12,570.
pub fn parse_tax_code(raw: &str) -> Option<f64> {
    let code = raw.trim().to_ascii_uppercase();
    let digits = code.strip_suffix('L')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().map(|n| f64::from(n) * 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_amount_clamps_invalid_values_to_zero() {
        assert_eq!(coerce_amount(f64::NAN), 0.0);
        assert_eq!(coerce_amount(f64::INFINITY), 0.0);
        assert_eq!(coerce_amount(-12.5), 0.0);
        assert_eq!(coerce_amount(12.5), 12.5);
    }

    #[test]
    fn parse_amount_accepts_formatted_currency() {
        assert_eq!(parse_amount("£45,000.50"), 45_000.5);
        assert_eq!(parse_amount("  300 "), 300.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("-20"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
    }

    #[test]
    fn parse_tax_code_reads_l_codes_only() {
        assert_eq!(parse_tax_code("1257L"), Some(12_570.0));
        assert_eq!(parse_tax_code(" 1100l "), Some(11_000.0));
        assert_eq!(parse_tax_code("BR"), None);
        assert_eq!(parse_tax_code("K475"), None);
        assert_eq!(parse_tax_code("L"), None);
        assert_eq!(parse_tax_code("12A7L"), None);
    }
}
