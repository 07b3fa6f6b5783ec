//! Form definitions backing the CRM routes.
//!
//! Validation runs entirely locally; a form that fails it never reaches the
//! API client.

use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

pub mod auth;
pub mod customer;
pub mod resource;

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors that can occur when processing form data.
pub enum FormError {
    /// User-facing messages in field order.
    #[error("{}", .0.join("；"))]
    Invalid(Vec<String>),

    #[error("{0}格式不正确")]
    InvalidNumber(&'static str),

    #[error("数据格式不正确: {0}")]
    InvalidDocument(String),
}

impl FormError {
    pub fn first_message(&self) -> String {
        match self {
            FormError::Invalid(messages) => messages.first().cloned().unwrap_or_default(),
            other => other.to_string(),
        }
    }
}

/// Runs the derived validation and orders the messages the way the fields
/// appear on the page.
pub fn validate_in_order<T: Validate>(form: &T, field_order: &[&str]) -> Result<(), FormError> {
    form.validate()
        .map_err(|errors| FormError::Invalid(ordered_messages(&errors, field_order)))
}

fn ordered_messages(errors: &ValidationErrors, field_order: &[&str]) -> Vec<String> {
    let field_errors = errors.field_errors();
    let mut messages = Vec::new();

    for field in field_order {
        if let Some(errors) = field_errors.get(*field) {
            messages.extend(errors.iter().map(error_message));
        }
    }
    for (field, errors) in &field_errors {
        if !field_order.contains(&field.as_ref()) {
            messages.extend(errors.iter().map(error_message));
        }
    }
    messages
}

fn error_message(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|message| message.to_string())
        .unwrap_or_else(|| crate::models::catalog::messages::VALIDATION_ERROR.to_string())
}

pub(crate) fn invalid(message: &'static str) -> ValidationError {
    ValidationError::new("invalid").with_message(Cow::Borrowed(message))
}

/// Fails on empty or whitespace-only input. The message comes from the attribute.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required"))
    } else {
        Ok(())
    }
}

/// Drops `null` and blank string members of a JSON object. Applying it twice
/// yields the same result as applying it once.
pub fn strip_empty(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, value)| !is_empty_value(value))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strip_empty_removes_null_and_blank() {
        let stripped = strip_empty(json!({
            "name": "Acme",
            "email": "",
            "phone": null,
            "notes": "  ",
            "credit_limit": 0,
            "tags": []
        }));

        assert_eq!(stripped, json!({"name": "Acme", "credit_limit": 0, "tags": []}));
    }

    #[test]
    fn strip_empty_is_idempotent() {
        let once = strip_empty(json!({"a": "", "b": "x", "c": null, "d": false}));
        let twice = strip_empty(once.clone());

        assert_eq!(once, twice);
    }
}
