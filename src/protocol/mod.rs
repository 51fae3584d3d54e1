//! Client protocol
//!
//! Inbound command decoding, structural validation and outbound envelopes.
//! The registry never sees unvalidated input: everything here runs in the
//! dispatcher before any registry call.

pub mod message;
pub mod outbound;
pub mod validation;

pub use message::{InboundMessage, MessageParams, MessageType};
pub use outbound::OutboundMessage;
pub use validation::{
    sub_field, FieldError, Validate, ValidationResult, FIELD_CHANNELS, FIELD_TOKEN, FIELD_TYPE,
};
