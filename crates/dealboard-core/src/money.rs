//! # Monetary Parsing
//!
//! The CRM reports opportunity amounts as decimal strings (`"1500.00"`).
//! Sums must be exact and deterministic, so parsing goes through
//! `rust_decimal` rather than floats; the workspace denies float
//! arithmetic outright.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse an opportunity amount.
///
/// Absent, empty, or unparseable values are zero. This mirrors the error
/// taxonomy of the dashboard: a parse failure is silently coerced, never
/// surfaced as a distinct error state.
#[must_use]
pub fn parse_amount(raw: Option<&str>) -> Decimal {
    raw.and_then(|s| Decimal::from_str(s.trim()).ok())
        .unwrap_or(Decimal::ZERO)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("literal decimal")
    }

    #[test]
    fn parses_plain_decimals() {
        assert_eq!(parse_amount(Some("100")), dec("100"));
        assert_eq!(parse_amount(Some("1500.50")), dec("1500.50"));
        assert_eq!(parse_amount(Some("  42.0 ")), dec("42.0"));
    }

    #[test]
    fn absent_is_zero() {
        assert_eq!(parse_amount(None), Decimal::ZERO);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(parse_amount(Some("")), Decimal::ZERO);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(parse_amount(Some("n/a")), Decimal::ZERO);
        assert_eq!(parse_amount(Some("100abc")), Decimal::ZERO);
        assert_eq!(parse_amount(Some("R$ 100")), Decimal::ZERO);
    }

    #[test]
    fn negative_amounts_parse() {
        assert_eq!(parse_amount(Some("-12.5")), dec("-12.5"));
    }
}
