//! Field validators shared by every entity.
//!
//! Each validator takes the raw JSON value of one field and returns the
//! normalized value (trimmed string, rounded price, integral count) or a
//! [`ValidationError`] with a message suitable for the API response.

use serde_json::Value;

use crate::errors::ValidationError;

pub const MAX_EMAIL_LEN: usize = 254;

/// Upper bound for monetary amounts; keeps totals and stats finite.
pub const MAX_PRICE: f64 = 1_000_000_000_000.0;

/// Largest integer accepted from JSON input (2^53, exact in f64).
const MAX_SAFE_INT: f64 = 9_007_199_254_740_992.0;

/// A fixed set of string values (statuses, roles).
pub trait EnumField: Sized + Copy + 'static {
    /// Field name used in error messages.
    const FIELD: &'static str;
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn allowed() -> String {
        Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::new(format!("{field} is required"))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Non-empty after trimming, at most `max` characters.
pub fn required_string(field: &str, raw: Option<&Value>, max: usize) -> Result<String, ValidationError> {
    match raw {
        None | Some(Value::Null) => Err(missing(field)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::new(format!("{field} cannot be empty")));
            }
            if trimmed.chars().count() > max {
                return Err(ValidationError::new(format!("{field} must be {max} characters or less")));
            }
            Ok(trimmed.to_string())
        }
        Some(_) => Err(ValidationError::new(format!("{field} must be a string"))),
    }
}

/// Absent, `null` or blank yields `None`; otherwise the same rules as [`required_string`].
pub fn optional_string(field: &str, raw: Option<&Value>, max: usize) -> Result<Option<String>, ValidationError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => required_string(field, Some(v), max).map(Some),
    }
}

/// A JSON number or a numeric string; must be finite.
pub fn number(field: &str, raw: Option<&Value>) -> Result<f64, ValidationError> {
    let value = match raw {
        None | Some(Value::Null) => return Err(missing(field)),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::new(format!("{field} must be a valid number"))),
    }
}

/// Monetary amount rounded to 2 decimal places. Zero is only accepted when `allow_zero`.
pub fn price(field: &str, raw: Option<&Value>, allow_zero: bool) -> Result<f64, ValidationError> {
    let value = number(field, raw)?;
    if value.abs() > MAX_PRICE {
        return Err(ValidationError::new(format!("{field} is out of range")));
    }
    let value = round2(value);
    if allow_zero && value < 0.0 {
        return Err(ValidationError::new(format!("{field} must be a non-negative number")));
    }
    if !allow_zero && value <= 0.0 {
        return Err(ValidationError::new(format!("{field} must be greater than 0")));
    }
    Ok(value)
}

pub fn integer(field: &str, raw: Option<&Value>) -> Result<i64, ValidationError> {
    let value = number(field, raw)?;
    if value.fract() != 0.0 {
        return Err(ValidationError::new(format!("{field} must be an integer")));
    }
    if value.abs() > MAX_SAFE_INT {
        return Err(ValidationError::new(format!("{field} is out of range")));
    }
    Ok(value as i64)
}

/// Stock and quantity on hand: `>= 0`.
pub fn non_negative_int(field: &str, raw: Option<&Value>) -> Result<u64, ValidationError> {
    let value = integer(field, raw)?;
    u64::try_from(value)
        .map_err(|_| ValidationError::new(format!("{field} must be a non-negative integer")))
}

/// Purchase counts and references: `>= 1`.
pub fn positive_int(field: &str, raw: Option<&Value>) -> Result<u64, ValidationError> {
    let value = integer(field, raw)?;
    if value < 1 {
        return Err(ValidationError::new(format!("{field} must be a positive integer")));
    }
    Ok(value as u64)
}

pub fn int_in_range(field: &str, raw: Option<&Value>, min: i64, max: i64) -> Result<i64, ValidationError> {
    let value = integer(field, raw)?;
    if !(min..=max).contains(&value) {
        return Err(ValidationError::new(format!("{field} must be between {min} and {max}")));
    }
    Ok(value)
}

/// `local@domain.tld`, lower-cased.
pub fn email(field: &str, raw: Option<&Value>) -> Result<String, ValidationError> {
    let value = required_string(field, raw, MAX_EMAIL_LEN)?.to_lowercase();
    if !is_valid_email(&value) {
        return Err(ValidationError::new(format!("Invalid {field} format")));
    }
    Ok(value)
}

fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// Membership in `E::ALL`, compared case-insensitively after trimming.
pub fn enum_value<E: EnumField>(raw: Option<&Value>) -> Result<E, ValidationError> {
    let invalid = || {
        ValidationError::new(format!("Invalid {}. Must be one of: {}", E::FIELD, E::allowed()))
    };
    match raw {
        None | Some(Value::Null) => Err(missing(E::FIELD)),
        Some(Value::String(s)) => {
            let wanted = s.trim();
            E::ALL
                .iter()
                .copied()
                .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                .ok_or_else(invalid)
        }
        Some(_) => Err(invalid()),
    }
}
