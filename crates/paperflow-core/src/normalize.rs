//! Canonicalization of extracted field values.
//!
//! Model output is messy: currency carries symbols and separators, dates
//! arrive in several formats, and "null"-ish placeholder strings stand in
//! for absent values. Everything persisted goes through these helpers so
//! both stores hold one canonical representation.

use chrono::NaiveDate;

use crate::defaults::CURRENCY_DECIMALS;

/// Placeholder tokens the model emits for absent values.
const NULLISH: &[&str] = &["null", "none", "n/a", "na", "unknown", "-", ""];

/// Trim a raw string value, mapping placeholder tokens to `None`.
pub fn clean_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if NULLISH.contains(&trimmed.to_ascii_lowercase().as_str()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Canonicalize a currency amount to a plain two-decimal string.
///
/// Accepts symbols, thousands separators and surrounding currency codes:
/// `"$1,200.00"`, `"USD 250"`, `"1200"` all become `"1200.00"`.
/// Unparseable input yields `None` (the field is dropped, not the record).
pub fn normalize_currency(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    // More than one decimal point means the value is garbage, not a number
    // with stripped separators.
    if cleaned.matches('.').count() > 1 {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(format!("{:.*}", CURRENCY_DECIMALS, value))
}

/// Date formats accepted from model output, most common first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Parse a date in any accepted format. Invalid input yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_trims() {
        assert_eq!(clean_text("  Acme HVAC  "), Some("Acme HVAC".to_string()));
    }

    #[test]
    fn test_clean_text_nullish_tokens() {
        for token in ["null", "NULL", "None", "n/a", "N/A", "", "  ", "-"] {
            assert_eq!(clean_text(token), None, "{token:?}");
        }
    }

    #[test]
    fn test_normalize_currency_symbols_and_separators() {
        assert_eq!(normalize_currency("$1,200.00"), Some("1200.00".to_string()));
        assert_eq!(normalize_currency("USD 250"), Some("250.00".to_string()));
        assert_eq!(normalize_currency("250.5"), Some("250.50".to_string()));
        assert_eq!(normalize_currency("€99.999"), Some("100.00".to_string()));
    }

    #[test]
    fn test_normalize_currency_uses_canonical_precision() {
        let canonical = normalize_currency("1200").unwrap();
        let fraction = canonical.split('.').nth(1).unwrap();
        assert_eq!(fraction.len(), CURRENCY_DECIMALS);
    }

    #[test]
    fn test_normalize_currency_rejects_garbage() {
        assert_eq!(normalize_currency("n/a"), None);
        assert_eq!(normalize_currency("1.2.3"), None);
        assert_eq!(normalize_currency(""), None);
        assert_eq!(normalize_currency("$"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        for raw in [
            "2024-01-05",
            "2024/01/05",
            "01/05/2024",
            "1/5/2024",
            "01-05-2024",
            "January 5, 2024",
            "Jan 5 2024",
            "5 January 2024",
        ] {
            assert_eq!(parse_date(raw), Some(expected), "{raw:?}");
        }
    }

    #[test]
    fn test_parse_date_rejects_invalid() {
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-13-40"), None);
        assert_eq!(parse_date(""), None);
    }
}
