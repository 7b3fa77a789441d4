//! QA Sphere tool implementations.
//!
//! Each submodule owns one API area and exposes:
//! - `descriptions()` with the tool names, descriptions and input schemas;
//! - one async handler per tool: validate arguments, call the API, check the
//!   response shape and return the text payload.
//!
//! Handlers return `Err` with a user-facing message; the MCP layer turns it
//! into a tool result with `isError: true`.

pub mod custom_fields;
pub mod folders;
pub mod projects;
pub mod requirements;
pub mod shared_preconditions;
pub mod shared_steps;
pub mod tags;
pub mod tcases;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{QaSphereError, QaSphereResult};

// ═══════════════════════════════════════════════════════════════════════════
// Input validation
// ═══════════════════════════════════════════════════════════════════════════

static PROJECT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{2,5}$").expect("project code pattern is valid"));

static LOOSE_PROJECT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]+$").expect("project code pattern is valid"));

static TEST_CASE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{2,5}-\d+$").expect("marker pattern is valid"));

/// Accepted values for `sortOrder`.
pub const SORT_ORDERS: &[&str] = &["asc", "desc"];

/// Accepted test case priorities.
pub const PRIORITIES: &[&str] = &["high", "medium", "low"];

/// Decodes tool arguments. Missing arguments are treated as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(arguments: Value) -> QaSphereResult<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| QaSphereError::invalid_params(format!("Invalid parameters: {}", e)))
}

/// Project code, 2 to 5 uppercase letters or digits.
pub(crate) fn validate_project_code(code: &str) -> QaSphereResult<()> {
    if PROJECT_CODE.is_match(code) {
        Ok(())
    } else {
        Err(QaSphereError::invalid_params(
            "Project code must be 2 to 5 characters in format PROJECT_CODE (e.g., BDI)",
        ))
    }
}

/// Project code without the length limit (folder and tag listings).
pub(crate) fn validate_loose_project_code(code: &str) -> QaSphereResult<()> {
    if LOOSE_PROJECT_CODE.is_match(code) {
        Ok(())
    } else {
        Err(QaSphereError::invalid_params(
            "Project code must be in format PROJECT_CODE (e.g., BDI)",
        ))
    }
}

/// Splits a `PROJECT_CODE-SEQUENCE` marker.
pub(crate) fn parse_marker(marker: &str) -> QaSphereResult<(&str, &str)> {
    if !TEST_CASE_MARKER.is_match(marker) {
        return Err(QaSphereError::invalid_params(
            "Marker must be in format PROJECT_CODE-SEQUENCE (e.g., BDI-123). Project code must be 2 to 5 characters in format PROJECT_CODE (e.g., BDI). Sequence must be a number.",
        ));
    }
    marker
        .split_once('-')
        .ok_or_else(|| QaSphereError::invalid_params("Marker is missing '-'"))
}

/// Checks that `value` is one of `allowed`.
pub(crate) fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> QaSphereResult<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(QaSphereError::invalid_params(format!(
            "{} must be one of: {} (got '{}')",
            field,
            allowed.join(", "),
            value
        )))
    }
}

/// Checks an optional enum-like value.
pub(crate) fn validate_opt_one_of(
    field: &str,
    value: Option<&str>,
    allowed: &[&str],
) -> QaSphereResult<()> {
    value.map_or(Ok(()), |v| validate_one_of(field, v, allowed))
}

/// Checks a string length in characters (inclusive bounds).
pub(crate) fn validate_len(field: &str, value: &str, min: usize, max: usize) -> QaSphereResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(QaSphereError::invalid_params(format!(
            "{} must be at least {} character{}",
            field,
            min,
            if min == 1 { "" } else { "s" }
        )));
    }
    if len > max {
        return Err(QaSphereError::invalid_params(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Checks that a string parses as an absolute URL.
pub(crate) fn validate_url(field: &str, value: &str) -> QaSphereResult<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|_| QaSphereError::invalid_params(format!("{} must be a valid URL", field)))
}

/// `sortOrder` only makes sense together with `sortField`.
pub(crate) fn require_sort_field(
    sort_field: Option<&str>,
    sort_order: Option<&str>,
) -> QaSphereResult<()> {
    if sort_order.is_some() && sort_field.is_none() {
        return Err(QaSphereError::invalid_params(
            "sortOrder can only be specified when sortField is provided.",
        ));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Response checks
// ═══════════════════════════════════════════════════════════════════════════

/// The field exists, whatever its value (including `null`).
pub(crate) fn present(value: &Value, key: &str) -> bool {
    value.get(key).is_some()
}

/// The field exists and is truthy (not null, false, 0 or an empty string).
pub(crate) fn truthy(value: &Value, key: &str) -> bool {
    match value.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// The field exists and is an array.
pub(crate) fn array_field<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value.get(key).and_then(Value::as_array)
}

// ═══════════════════════════════════════════════════════════════════════════
// Failure messages
// ═══════════════════════════════════════════════════════════════════════════

/// Rewrites an API failure into the tool's user-facing message.
///
/// `by_status` gets the HTTP status and the server message and may return a
/// specific text. Anything it does not handle, including transport failures,
/// becomes `Failed to {action}: {message}`. Non-API errors pass through.
pub(crate) fn describe_failure<F>(err: QaSphereError, action: &str, by_status: F) -> QaSphereError
where
    F: FnOnce(u16, &str) -> Option<String>,
{
    match err {
        QaSphereError::Api {
            status,
            message,
            server_message,
        } => {
            let described = status
                .and_then(|s| by_status(s, &message))
                .unwrap_or_else(|| format!("Failed to {}: {}", action, message));
            QaSphereError::Api {
                status,
                message: described,
                server_message,
            }
        }
        other => other,
    }
}

/// Messages for 401 and 403, shared by most tools.
pub(crate) fn auth_failure(status: u16) -> Option<String> {
    match status {
        401 => Some("Invalid or missing API key".to_string()),
        403 => Some("Insufficient permissions or suspended tenant".to_string()),
        _ => None,
    }
}

/// JSON schema fragment for a project code argument.
pub(crate) fn project_code_schema() -> Value {
    json!({
        "type": "string",
        "pattern": "^[A-Z0-9]{2,5}$",
        "description": "Project code identifier (e.g., BDI)"
    })
}

/// JSON schema fragment for `sortOrder`.
pub(crate) fn sort_order_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "enum": SORT_ORDERS,
        "description": description
    })
}
