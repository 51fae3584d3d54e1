//! Error types
//!
//! The subscription registry itself never fails; these errors cover decoding,
//! validation and authentication of inbound messages, which the dispatcher
//! turns into error notifications on the connection.

use crate::protocol::ValidationResult;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Crate error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Inbound payload is not a valid message
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// Outbound message could not be serialized
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Message decoded but failed structural validation
    #[error("invalid message: {0}")]
    Invalid(ValidationResult),

    /// Authentication was required and failed
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// Metric registration failed
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Authentication failure reported by a connection's authenticator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No authenticator was configured for the connection
    #[error("authentication is not supported on this connection")]
    Unsupported,

    /// Token was rejected
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Connection is already bound to a different user
    #[error("connection already authenticated as another user")]
    UserMismatch,

    /// Private channel requested without a user identity
    #[error("channel {0} requires authentication")]
    Required(String),
}

impl Error {
    /// Convert into the validation result delivered on the error channel
    pub fn to_result(&self) -> ValidationResult {
        match self {
            Error::Decode(e) => ValidationResult::new(codes::INVALID_MESSAGE, e.to_string()),
            Error::Encode(e) => ValidationResult::new(codes::INTERNAL, e.to_string()),
            Error::Invalid(result) => result.clone(),
            Error::Unauthorized(AuthError::Required(channel)) => {
                let mut result = ValidationResult::new(codes::UNAUTHORIZED, self.to_string());
                result.add_field_error(
                    crate::protocol::FIELD_CHANNELS,
                    format!("channel {} requires authentication", channel),
                );
                result
            }
            Error::Unauthorized(e @ AuthError::InvalidToken(_)) => {
                let mut result = ValidationResult::new(codes::UNAUTHORIZED, self.to_string());
                result.add_field_error(crate::protocol::FIELD_TOKEN, e.to_string());
                result
            }
            Error::Unauthorized(e) => ValidationResult::new(codes::UNAUTHORIZED, e.to_string()),
            Error::Metrics(e) => ValidationResult::new(codes::INTERNAL, e.to_string()),
        }
    }
}

/// Error codes carried in error notifications
pub mod codes {
    pub const INVALID_MESSAGE: &str = "invalid_message";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const INTERNAL: &str = "internal";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_to_result() {
        let err = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let result = Error::Decode(err).to_result();

        assert!(!result.is_valid());
        assert_eq!(result.code.as_deref(), Some(codes::INVALID_MESSAGE));
    }

    #[test]
    fn test_required_auth_names_channel() {
        let err = Error::from(AuthError::Required("inbox".to_string()));
        let result = err.to_result();

        assert_eq!(result.code.as_deref(), Some(codes::UNAUTHORIZED));
        assert_eq!(result.field_errors.len(), 1);
        assert_eq!(result.field_errors[0].field, "channels");
        assert!(result.field_errors[0].error.contains("inbox"));
    }

    #[test]
    fn test_invalid_passes_result_through() {
        let mut inner = ValidationResult::new(codes::VALIDATION_FAILED, "bad");
        inner.add_field_error("type", "unknown message type");
        let result = Error::Invalid(inner.clone()).to_result();

        assert_eq!(result, inner);
    }
}
