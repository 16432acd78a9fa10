//! Shared argument checks for command handlers.
//!
//! Keeps numeric coercion and geometry bounds in one place so every handler
//! reports the same messages.

use crate::error::ConsoleError;

/// Parse one positional argument as a finite number.
pub fn parse_number(token: &str) -> Result<f64, ConsoleError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ConsoleError::InvalidNumber {
            token: token.to_string(),
        }),
    }
}

/// Parse every token, failing on the first that is not a finite number.
pub fn parse_numbers(tokens: &[String]) -> Result<Vec<f64>, ConsoleError> {
    tokens.iter().map(|t| parse_number(t)).collect()
}

/// `value > 0`, otherwise `"<what> must be greater than 0"`.
pub fn validate_positive(value: f64, what: &str) -> Result<(), ConsoleError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConsoleError::validation(format!("{what} must be greater than 0")))
    }
}

/// Side or point count of a polygon/star: an integer of at least 3.
pub fn validate_vertex_count(value: f64, what: &str) -> Result<u32, ConsoleError> {
    if value.fract() != 0.0 || value < 3.0 {
        return Err(ConsoleError::validation(format!(
            "{what} must be an integer greater than 2"
        )));
    }
    if value > f64::from(u32::MAX) {
        return Err(ConsoleError::validation(format!(
            "{what} must be at most {}",
            u32::MAX
        )));
    }
    // Integral and within u32 range, checked above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(value as u32)
}

/// Star inner radius ratio, exclusive at both ends.
pub fn validate_inner_ratio(ratio: f64) -> Result<(), ConsoleError> {
    if ratio > 0.0 && ratio < 1.0 {
        Ok(())
    } else {
        Err(ConsoleError::validation(
            "Inner radius ratio must be between 0 and 1",
        ))
    }
}
