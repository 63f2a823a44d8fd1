//! Validation of user-entered numbers.
//!
//! Text that does not parse is reported, never coerced to zero.

/// Why a user-entered value was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("{field} is empty")]
    Empty { field: &'static str },
    #[error("{field} is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be finite")]
    NotFinite { field: &'static str },
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

/// Parse a strictly positive, finite decimal such as a weight or height.
pub fn parse_positive_f64(field: &'static str, text: &str) -> Result<f64, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty { field });
    }

    let value: f64 = trimmed.parse().map_err(|_| InputError::NotANumber {
        field,
        value: trimmed.to_string(),
    })?;

    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value <= 0.0 {
        return Err(InputError::NotPositive { field });
    }
    Ok(value)
}

/// Parse a daily step goal: a positive whole number.
pub fn parse_step_goal(text: &str) -> Result<u32, InputError> {
    const FIELD: &str = "daily step goal";

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty { field: FIELD });
    }

    let value: i64 = trimmed.parse().map_err(|_| InputError::NotANumber {
        field: FIELD,
        value: trimmed.to_string(),
    })?;

    if value <= 0 {
        return Err(InputError::NotPositive { field: FIELD });
    }
    u32::try_from(value).map_err(|_| InputError::NotANumber {
        field: FIELD,
        value: trimmed.to_string(),
    })
}
