//! Request validation for the board API

use crate::api::errors::ValidationError;
use serde_json::Value;

/// Trimmed value of a required text field.
pub fn require_text(
    value: Option<&str>,
    field: &str,
    message: &str,
) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
            value: value.map(|v| Value::String(v.to_string())),
        }),
    }
}

/// Trimmed value of an optional text field; blank counts as absent.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Validate EVM-style address format
pub fn validate_address(address: &str, field: &str) -> Result<(), ValidationError> {
    let invalid = |message: &str| ValidationError {
        field: field.to_string(),
        message: message.to_string(),
        value: Some(Value::String(address.to_string())),
    };

    if !address.starts_with("0x") {
        return Err(invalid("Address must start with '0x'"));
    }

    if address.len() != 42 {
        return Err(invalid("Address must be 42 characters long (including '0x')"));
    }

    if !is_valid_hex(&address[2..]) {
        return Err(invalid("Address contains invalid hex characters"));
    }

    Ok(())
}

fn is_valid_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}
