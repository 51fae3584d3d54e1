//! Statistics and metrics

pub mod metrics;

pub use metrics::{MetricsCollector, NoopCollector, PrometheusCollector, RegistryStats};
