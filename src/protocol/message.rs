//! Inbound message model
//!
//! Clients send JSON envelopes of the form
//!
//! ```json
//! {"type": "subscribe", "params": {"channels": ["alerts", "feed"], "token": "..."}}
//! ```

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{codes, Error, Result};

use super::validation::{sub_field, Validate, ValidationResult, FIELD_CHANNELS, FIELD_TYPE};

/// Command carried by an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Subscribe,
    Unsubscribe,
    /// Any type this server does not recognize
    #[serde(other)]
    Unknown,
}

/// Parameters of an inbound message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageParams {
    #[serde(default)]
    pub channels: Vec<Channel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Decoded inbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,

    #[serde(default)]
    pub params: MessageParams,
}

impl InboundMessage {
    /// Create a message
    pub fn new(message_type: MessageType, channels: Vec<Channel>) -> Self {
        Self {
            message_type,
            params: MessageParams {
                channels,
                token: None,
            },
        }
    }

    /// Attach an auth token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.params.token = Some(token.into());
        self
    }

    /// Decode a message from raw bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(Error::Decode)
    }

    /// Validate with an upper bound on the channel list (0 = unlimited)
    pub fn validate_with_limit(&self, max_channels: usize) -> ValidationResult {
        let mut result = ValidationResult::valid();

        if self.message_type == MessageType::Unknown {
            result.add_field_error(FIELD_TYPE, "unknown message type");
        }

        if self.params.channels.is_empty() {
            result.add_field_error(FIELD_CHANNELS, "at least one channel is required");
        } else if max_channels > 0 && self.params.channels.len() > max_channels {
            result.add_field_error(
                FIELD_CHANNELS,
                format!("at most {} channels are allowed", max_channels),
            );
        }

        for (i, channel) in self.params.channels.iter().enumerate() {
            if channel.is_empty() {
                result.add_field_error(sub_field(FIELD_CHANNELS, i), "channel name must not be empty");
            }
        }

        if !result.field_errors.is_empty() {
            result.code = Some(codes::VALIDATION_FAILED.to_string());
            result.error = Some("message validation failed".to_string());
        }

        result
    }
}

impl Validate for InboundMessage {
    fn validate(&self) -> ValidationResult {
        self.validate_with_limit(0)
    }
}
