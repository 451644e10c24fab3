//! Domain models for the meditrack system.

mod category;
pub mod dates;
mod diagnosis;
mod patient;
mod record;

pub use category::*;
pub use diagnosis::*;
pub use patient::*;
pub use record::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single violated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON path of the field (e.g. `email`, `diagnosis.details.ki67`)
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Schema or invariant violation, carrying every offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed: {}", summarize(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

impl ValidationError {
    /// Error for a single field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// `Ok(())` when no errors were collected.
    pub fn check(errors: Vec<FieldError>) -> ValidationResult<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }

    /// Names of the violated fields, in detection order.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    /// Whether `field` is among the violations.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Read an optional string field from a JSON object, recording type errors.
pub(crate) fn optional_str<'a>(
    object: &'a serde_json::Map<String, serde_json::Value>,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    match object.get(key) {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(_) => {
            errors.push(FieldError::new(key, "expected a string"));
            None
        }
    }
}

/// Read a required string field from a JSON object, recording errors.
pub(crate) fn required_str<'a>(
    object: &'a serde_json::Map<String, serde_json::Value>,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    if matches!(object.get(key), None | Some(serde_json::Value::Null)) {
        errors.push(FieldError::new(key, "is required"));
        return None;
    }
    optional_str(object, key, errors)
}

/// Read an optional timestamp field, recording parse errors.
pub(crate) fn optional_timestamp(
    object: &serde_json::Map<String, serde_json::Value>,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = optional_str(object, key, errors)?;
    let parsed = dates::parse_timestamp(raw);
    if parsed.is_none() {
        errors.push(FieldError::new(key, format!("invalid date: {}", raw)));
    }
    parsed
}
