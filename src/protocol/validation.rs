//! Validation results
//!
//! A `ValidationResult` collects an error message, an error code and any
//! number of per-field errors. It is serialized as the payload of the error
//! notification sent back to the client.

use serde::{Deserialize, Serialize};

/// Field name of the message type
pub const FIELD_TYPE: &str = "type";
/// Field name of the channel list
pub const FIELD_CHANNELS: &str = "channels";
/// Field name of the auth token
pub const FIELD_TOKEN: &str = "token";

const SUB_FIELD_SEPARATOR: &str = ":";

/// Types that can validate themselves
pub trait Validate {
    fn validate(&self) -> ValidationResult;
}

/// A single field-level error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// Outcome of validating an inbound message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl ValidationResult {
    /// Create a failed result with a code and message
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            code: Some(code.into()),
            field_errors: Vec::new(),
        }
    }

    /// Create an empty (valid) result
    pub fn valid() -> Self {
        Self::default()
    }

    pub fn add_field_error(&mut self, field: impl Into<String>, error: impl Into<String>) {
        self.field_errors.push(FieldError {
            field: field.into(),
            error: error.into(),
        });
    }

    /// A result is valid when it carries no error, no code and no field errors
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.code.is_none() && self.field_errors.is_empty()
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.error) {
            (Some(code), Some(error)) => write!(f, "[{}] {}", code, error)?,
            (Some(code), None) => write!(f, "[{}]", code)?,
            (None, Some(error)) => f.write_str(error)?,
            (None, None) => f.write_str("validation failed")?,
        }
        for fe in &self.field_errors {
            write!(f, "; {}: {}", fe.field, fe.error)?;
        }
        Ok(())
    }
}

/// Build a field name for a child of `field`, e.g. `channels:2`
pub fn sub_field(field: &str, child: impl std::fmt::Display) -> String {
    format!("{}{}{}", field, SUB_FIELD_SEPARATOR, child)
}
