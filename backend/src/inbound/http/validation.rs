//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every validation failure becomes `400 invalid_request` with
//! `details: {field, code}` so clients can point at the offending input.

use serde_json::{Value, json};

use crate::domain::{Error, LoadValidationError, UserValidationError};

/// Validation error codes raised by the HTTP layer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldErrorCode {
    MissingField,
    InvalidType,
}

impl FieldErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidType => "invalid_type",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        name,
        FieldErrorCode::MissingField.as_str(),
        format!("missing required field: {name}"),
    )
}

pub(crate) fn invalid_type_error(field: FieldName, expected: &str) -> Error {
    let name = field.as_str();
    field_error(
        name,
        FieldErrorCode::InvalidType.as_str(),
        format!("{name} must be a {expected}"),
    )
}

/// Extract a required string from a loosely typed JSON field.
pub(crate) fn require_string(value: Option<Value>, field: FieldName) -> Result<String, Error> {
    match value {
        None | Some(Value::Null) => Err(missing_field_error(field)),
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(invalid_type_error(field, "string")),
    }
}

pub(crate) fn user_validation_error(err: &UserValidationError) -> Error {
    field_error(err.field(), err.code(), err.to_string())
}

pub(crate) fn load_validation_error(err: &LoadValidationError) -> Error {
    field_error(err.field(), err.code(), err.to_string())
}
