//! Registry metrics
//!
//! The registry reports its index sizes to a `MetricsCollector` from inside
//! its critical section, so an observer never sees a gauge that disagrees
//! with the indices at that instant.

use prometheus::{IntCounter, IntGauge, Opts, Registry, TextEncoder};

use crate::error::Result;

/// Sink for registry metrics
pub trait MetricsCollector: Send + Sync {
    /// Number of connections with at least one subscription
    fn open_connections(&self, count: usize);

    /// Number of channels with at least one subscriber
    fn subscribed_channels(&self, count: usize);

    /// Number of users with a registered connection
    fn private_connections(&self, count: usize);

    /// A user mapping was created
    fn private_connections_inc(&self);

    /// A user mapping was removed
    fn private_connections_dec(&self);
}

/// Collector that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCollector;

impl MetricsCollector for NoopCollector {
    fn open_connections(&self, _count: usize) {}
    fn subscribed_channels(&self, _count: usize) {}
    fn private_connections(&self, _count: usize) {}
    fn private_connections_inc(&self) {}
    fn private_connections_dec(&self) {}
}

/// Prometheus-backed collector
///
/// Metrics live on a dedicated `prometheus::Registry` so several instances
/// (e.g. in tests) never collide on the global default registry.
#[derive(Clone)]
pub struct PrometheusCollector {
    registry: Registry,
    open_connections: IntGauge,
    subscribed_channels: IntGauge,
    private_connections: IntGauge,
    private_opened: IntCounter,
    private_closed: IntCounter,
}

impl PrometheusCollector {
    /// Create and register all metrics under `namespace`
    pub fn new(namespace: &str) -> Result<Self> {
        let registry = Registry::new();

        let open_connections = IntGauge::with_opts(
            Opts::new("open_connections", "Connections with at least one subscription")
                .namespace(namespace),
        )?;
        let subscribed_channels = IntGauge::with_opts(
            Opts::new("subscribed_channels", "Channels with at least one subscriber")
                .namespace(namespace),
        )?;
        let private_connections = IntGauge::with_opts(
            Opts::new("private_connections", "Users with a registered connection")
                .namespace(namespace),
        )?;
        let private_opened = IntCounter::with_opts(
            Opts::new("private_connections_opened_total", "User mappings created")
                .namespace(namespace),
        )?;
        let private_closed = IntCounter::with_opts(
            Opts::new("private_connections_closed_total", "User mappings removed")
                .namespace(namespace),
        )?;

        registry.register(Box::new(open_connections.clone()))?;
        registry.register(Box::new(subscribed_channels.clone()))?;
        registry.register(Box::new(private_connections.clone()))?;
        registry.register(Box::new(private_opened.clone()))?;
        registry.register(Box::new(private_closed.clone()))?;

        Ok(Self {
            registry,
            open_connections,
            subscribed_channels,
            private_connections,
            private_opened,
            private_closed,
        })
    }

    /// The underlying Prometheus registry, for mounting on an HTTP endpoint
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather_text(&self) -> Result<String> {
        let families = self.registry.gather();
        Ok(TextEncoder::new().encode_to_string(&families)?)
    }
}

impl MetricsCollector for PrometheusCollector {
    fn open_connections(&self, count: usize) {
        self.open_connections.set(count as i64);
    }

    fn subscribed_channels(&self, count: usize) {
        self.subscribed_channels.set(count as i64);
    }

    fn private_connections(&self, count: usize) {
        self.private_connections.set(count as i64);
    }

    fn private_connections_inc(&self) {
        self.private_opened.inc();
    }

    fn private_connections_dec(&self) {
        self.private_closed.inc();
    }
}

impl std::fmt::Debug for PrometheusCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusCollector")
            .field("open_connections", &self.open_connections.get())
            .field("subscribed_channels", &self.subscribed_channels.get())
            .field("private_connections", &self.private_connections.get())
            .finish()
    }
}

/// Point-in-time sizes of the registry indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Connections with at least one subscription
    pub open_connections: usize,
    /// Channels with at least one subscriber
    pub subscribed_channels: usize,
    /// Users with a registered connection
    pub private_connections: usize,
}
