//! Outbound envelopes
//!
//! Everything the server writes to a client is wrapped in an envelope naming
//! the channel it belongs to. Error notifications use the `error` channel.

use bytes::Bytes;
use serde::Serialize;

use crate::channel::{Channel, ERROR_CHANNEL};
use crate::error::{Error, Result};

use super::validation::ValidationResult;

/// Message written to a connection
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage<T> {
    pub channel: Channel,
    pub data: T,
}

impl<T: Serialize> OutboundMessage<T> {
    pub fn new(channel: Channel, data: T) -> Self {
        Self { channel, data }
    }

    /// Serialize into a frame ready for the transport
    pub fn encode(&self) -> Result<Bytes> {
        serde_json::to_vec(self).map(Bytes::from).map_err(Error::Encode)
    }
}

impl OutboundMessage<ValidationResult> {
    /// Error notification for the client
    pub fn error(result: ValidationResult) -> Self {
        Self::new(Channel::from(ERROR_CHANNEL), result)
    }
}
