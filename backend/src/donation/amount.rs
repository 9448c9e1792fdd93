//! Donation amount validation and cents/dollars conversion.
//!
//! Amounts cross every boundary (HTTP, session handoff, payment provider) as
//! integer cents. Dollars exist only as display strings and as raw form input.

use std::fmt;

use serde_json::Value;

/// Inclusive range of accepted donation amounts, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountBounds {
    pub min_cents: i64,
    pub max_cents: i64,
}

impl Default for AmountBounds {
    fn default() -> Self {
        Self {
            min_cents: 100,
            max_cents: 1_000_000,
        }
    }
}

/// Reason an amount was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    NotNumeric,
    BelowMinimum { min_cents: i64 },
    AboveMaximum { max_cents: i64 },
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::NotNumeric => write!(f, "Please enter a valid donation amount"),
            AmountError::BelowMinimum { min_cents } => {
                write!(f, "Minimum donation amount is ${}", format_dollars(*min_cents))
            }
            AmountError::AboveMaximum { max_cents } => {
                write!(f, "Maximum donation amount is ${}", format_dollars(*max_cents))
            }
        }
    }
}

impl std::error::Error for AmountError {}

/// Check an amount already expressed in cents against `bounds`.
pub fn validate_cents(cents: i64, bounds: AmountBounds) -> Result<i64, AmountError> {
    if cents < bounds.min_cents {
        return Err(AmountError::BelowMinimum {
            min_cents: bounds.min_cents,
        });
    }
    if cents > bounds.max_cents {
        return Err(AmountError::AboveMaximum {
            max_cents: bounds.max_cents,
        });
    }
    Ok(cents)
}

/// Validate untyped input holding an amount in cents.
///
/// Accepts integral values written either as integers (`"2500"`) or as
/// floats with no fractional part (`"2500.0"`).
pub fn validate_amount(raw: &str, bounds: AmountBounds) -> Result<i64, AmountError> {
    let raw = raw.trim();
    if let Ok(cents) = raw.parse::<i64>() {
        return validate_cents(cents, bounds);
    }

    let value: f64 = raw.parse().map_err(|_| AmountError::NotNumeric)?;
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return Err(AmountError::NotNumeric);
    }
    validate_cents(value as i64, bounds)
}

/// Validate an amount in cents taken from a JSON body.
pub fn validate_json_amount(value: &Value, bounds: AmountBounds) -> Result<i64, AmountError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(cents) => validate_cents(cents, bounds),
            None => validate_amount(&n.to_string(), bounds),
        },
        Value::String(s) => validate_amount(s, bounds),
        _ => Err(AmountError::NotNumeric),
    }
}

/// Render cents as a two-decimal dollar string (`2500` -> `"25.00"`).
pub fn format_dollars(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse dollars typed into the donation form (`"$25.5"` -> `2550`).
///
/// At most two decimal places; thousands separators and a leading `$` are
/// tolerated. Negative input is rejected.
pub fn parse_dollars(input: &str) -> Option<i64> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let (whole, frac) = match cleaned.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (cleaned.as_str(), ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };

    whole.checked_mul(100)?.checked_add(frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BOUNDS: AmountBounds = AmountBounds {
        min_cents: 100,
        max_cents: 1_000_000,
    };

    #[test]
    fn test_bounds_are_inclusive() {
        for cents in [100, 101, 2500, 999_999, 1_000_000] {
            assert_eq!(validate_cents(cents, BOUNDS), Ok(cents));
        }
    }

    #[test]
    fn test_out_of_range_amounts_rejected() {
        assert_eq!(
            validate_cents(99, BOUNDS),
            Err(AmountError::BelowMinimum { min_cents: 100 })
        );
        assert_eq!(
            validate_cents(0, BOUNDS),
            Err(AmountError::BelowMinimum { min_cents: 100 })
        );
        assert_eq!(
            validate_cents(1_000_001, BOUNDS),
            Err(AmountError::AboveMaximum {
                max_cents: 1_000_000
            })
        );
    }

    #[test]
    fn test_non_numeric_input_rejected() {
        for raw in ["", "abc", "25 dollars", "NaN", "inf", "12.5"] {
            assert_eq!(
                validate_amount(raw, BOUNDS),
                Err(AmountError::NotNumeric),
                "{raw:?}"
            );
        }
        assert_eq!(validate_amount(" 2500 ", BOUNDS), Ok(2500));
        assert_eq!(validate_amount("2500.0", BOUNDS), Ok(2500));
    }

    #[test]
    fn test_error_messages_are_human_readable() {
        assert_eq!(
            validate_cents(50, BOUNDS).unwrap_err().to_string(),
            "Minimum donation amount is $1.00"
        );
        assert_eq!(
            validate_cents(2_000_000, BOUNDS).unwrap_err().to_string(),
            "Maximum donation amount is $10000.00"
        );
    }

    #[test]
    fn test_json_amounts() {
        assert_eq!(validate_json_amount(&json!(2500), BOUNDS), Ok(2500));
        assert_eq!(validate_json_amount(&json!("2500"), BOUNDS), Ok(2500));
        assert_eq!(
            validate_json_amount(&json!(25.5), BOUNDS),
            Err(AmountError::NotNumeric)
        );
        assert_eq!(
            validate_json_amount(&json!(null), BOUNDS),
            Err(AmountError::NotNumeric)
        );
        assert_eq!(
            validate_json_amount(&json!(true), BOUNDS),
            Err(AmountError::NotNumeric)
        );
    }

    #[test]
    fn test_format_dollars_matches_two_decimal_division() {
        assert_eq!(format_dollars(100), "1.00");
        assert_eq!(format_dollars(2500), "25.00");
        assert_eq!(format_dollars(100_000), "1000.00");
        assert_eq!(format_dollars(5), "0.05");
        assert_eq!(format_dollars(0), "0.00");
        assert_eq!(format_dollars(-150), "-1.50");
    }

    #[test]
    fn test_dollars_parse_into_cents_not_dollars() {
        assert_eq!(parse_dollars("25"), Some(2500));
        assert_eq!(parse_dollars("25.5"), Some(2550));
        assert_eq!(parse_dollars("$1,000.00"), Some(100_000));
        assert_eq!(parse_dollars(".75"), Some(75));
        assert_eq!(parse_dollars("25.505"), None);
        assert_eq!(parse_dollars("-5"), None);
        assert_eq!(parse_dollars(""), None);
        assert_eq!(parse_dollars("twenty"), None);

        // A dollar amount must never be mistaken for cents on the way out.
        let cents = parse_dollars("25").unwrap();
        assert_eq!(format_dollars(cents), "25.00");
    }
}
