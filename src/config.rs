//! Configuration

use crate::channel::{Channel, ChannelSet};

/// Default capacity of each connection's outbound queue
pub const DEFAULT_OUTBOUND_BUFFER_SIZE: usize = 256;

/// Default Prometheus namespace
pub const DEFAULT_METRICS_NAMESPACE: &str = "channelize";

/// Configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity of each connection's outbound queue
    pub outbound_buffer_size: usize,

    /// Namespace prefixed to every exported metric
    pub metrics_namespace: String,

    /// Maximum channels accepted in one message (0 = unlimited)
    pub max_channels_per_message: usize,

    /// Channels that require an authenticated user
    pub private_channels: ChannelSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            outbound_buffer_size: DEFAULT_OUTBOUND_BUFFER_SIZE,
            metrics_namespace: DEFAULT_METRICS_NAMESPACE.to_string(),
            max_channels_per_message: 0, // Unlimited
            private_channels: ChannelSet::new(),
        }
    }
}

impl Config {
    /// Set the outbound queue capacity
    pub fn outbound_buffer_size(mut self, size: usize) -> Self {
        self.outbound_buffer_size = size.max(1);
        self
    }

    /// Set the metrics namespace
    pub fn metrics_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metrics_namespace = namespace.into();
        self
    }

    /// Limit the number of channels per message
    pub fn max_channels_per_message(mut self, max: usize) -> Self {
        self.max_channels_per_message = max;
        self
    }

    /// Declare a private channel
    pub fn private_channel(mut self, channel: impl Into<Channel>) -> Self {
        self.private_channels.insert_private(channel);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.outbound_buffer_size, DEFAULT_OUTBOUND_BUFFER_SIZE);
        assert_eq!(config.metrics_namespace, "channelize");
        assert_eq!(config.max_channels_per_message, 0);
        assert_eq!(config.private_channels.private_count(), 0);
    }

    #[test]
    fn test_builder_outbound_buffer_size_floor() {
        let config = Config::default().outbound_buffer_size(0);

        assert_eq!(config.outbound_buffer_size, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = Config::default()
            .outbound_buffer_size(16)
            .metrics_namespace("ws")
            .max_channels_per_message(8)
            .private_channel("notifications")
            .private_channel("inbox");

        assert_eq!(config.outbound_buffer_size, 16);
        assert_eq!(config.metrics_namespace, "ws");
        assert_eq!(config.max_channels_per_message, 8);
        assert!(config.private_channels.is_private(&Channel::from("inbox")));
        assert!(!config.private_channels.is_private(&Channel::from("feed")));
    }
}
