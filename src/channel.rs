//! Channel identifiers
//!
//! A channel is a named topic that connections subscribe to. Channels are
//! public unless declared private, in which case only authenticated
//! connections may subscribe.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Name of the channel used to deliver error notifications to a connection
pub const ERROR_CHANNEL: &str = "error";

/// Topic identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    /// Create a new channel
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the channel name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Set of channels that require an authenticated user
#[derive(Debug, Clone, Default)]
pub struct ChannelSet {
    private: HashSet<Channel>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a channel private
    pub fn insert_private(&mut self, channel: impl Into<Channel>) {
        self.private.insert(channel.into());
    }

    /// Check whether subscribing to the channel requires a user identity
    pub fn is_private(&self, channel: &Channel) -> bool {
        self.private.contains(channel)
    }

    /// Number of private channels declared
    pub fn private_count(&self) -> usize {
        self.private.len()
    }
}

impl<C: Into<Channel>> FromIterator<C> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self {
            private: iter.into_iter().map(Into::into).collect(),
        }
    }
}
