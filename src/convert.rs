//! Argument extraction helpers for tool handlers.
//!
//! Every helper reports a bad argument as [`McpError::MissingArg`] or
//! [`McpError::InvalidArg`], both of which surface as `invalid-arguments`.
//! Empty strings count as absent for optional arguments.

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

/// Arguments of one `tools/call`.
pub type Args = Map<String, JsonValue>;

/// Helper to get a required, non-blank string argument.
pub fn get_string_arg(args: &Args, name: &str) -> Result<String> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Err(McpError::MissingArg(name.to_string())),
        Some(JsonValue::String(s)) if s.trim().is_empty() => {
            Err(McpError::invalid_arg(name, "must not be empty"))
        }
        Some(JsonValue::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(McpError::invalid_arg(name, "expected a string")),
    }
}

/// Helper to get an optional string argument. Blank strings are `None`.
pub fn get_optional_string(args: &Args, name: &str) -> Result<Option<String>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(McpError::invalid_arg(name, "expected a string")),
    }
}

/// Helper to get an optional boolean argument, `false` when absent.
pub fn get_flag(args: &Args, name: &str) -> Result<bool> {
    get_flag_or(args, name, false)
}

/// Helper to get an optional boolean argument, or `default`.
pub fn get_flag_or(args: &Args, name: &str, default: bool) -> Result<bool> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(default),
        Some(JsonValue::Bool(b)) => Ok(*b),
        Some(_) => Err(McpError::invalid_arg(name, "expected a boolean")),
    }
}

/// Helper to get an integer argument within `min..=max`, or `default`.
pub fn get_bounded_u64(args: &Args, name: &str, default: u64, min: u64, max: u64) -> Result<u64> {
    let value = match args.get(name) {
        None | Some(JsonValue::Null) => return Ok(default),
        Some(v) => v
            .as_u64()
            .ok_or_else(|| McpError::invalid_arg(name, "expected a non-negative integer"))?,
    };
    if value < min || value > max {
        return Err(McpError::invalid_arg(
            name,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(value)
}

/// Helper to get a required signed integer argument.
pub fn get_i64_arg(args: &Args, name: &str) -> Result<i64> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Err(McpError::MissingArg(name.to_string())),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| McpError::invalid_arg(name, "expected an integer")),
    }
}

/// Helper to get a string argument restricted to `allowed`, or `default`.
pub fn get_choice(args: &Args, name: &str, default: &str, allowed: &[&str]) -> Result<String> {
    let value = get_optional_string(args, name)?.unwrap_or_else(|| default.to_string());
    if allowed.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(McpError::invalid_arg(
            name,
            format!("must be one of: {}", allowed.join(", ")),
        ))
    }
}

/// Helper to check that a date argument is `YYYY-MM-DD`.
pub fn get_optional_date(args: &Args, name: &str) -> Result<Option<String>> {
    let Some(value) = get_optional_string(args, name)? else {
        return Ok(None);
    };
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(McpError::invalid_arg(name, "expected a date as YYYY-MM-DD"));
    }
    Ok(Some(value))
}
