//! Channel subscription registry for fan-out servers
//!
//! `channelize` tracks which live connections subscribe to which named
//! channels, and which authenticated user owns which connection. A server
//! feeds inbound client messages through the [`Dispatcher`], and its fan-out
//! code asks the [`SubscriptionRegistry`] who to deliver to.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use channelize::{
//!     Channel, Config, Connection, ConnectionWrapper, Dispatcher, PrometheusCollector,
//!     SubscriptionRegistry,
//! };
//!
//! # async fn example() -> channelize::Result<()> {
//! let config = Config::default().private_channel("notifications");
//! let collector = Arc::new(PrometheusCollector::new(&config.metrics_namespace)?);
//! let registry = Arc::new(SubscriptionRegistry::with_collector(collector));
//! let dispatcher = Dispatcher::new(Arc::clone(&registry), &config);
//!
//! let (conn, _outbound) = Connection::new(&config);
//! let conn = Arc::new(conn);
//! dispatcher
//!     .parse_message(&conn, br#"{"type":"subscribe","params":{"channels":["feed"]}}"#)
//!     .await;
//!
//! for subscriber in registry.connections(&Channel::from("feed")).await {
//!     println!("deliver to {}", subscriber.id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod conn;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod stats;

pub use channel::{Channel, ChannelSet};
pub use config::Config;
pub use conn::{Connection, ConnectionId, ConnectionWrapper, UserId};
pub use dispatch::Dispatcher;
pub use error::{AuthError, Error, Result};
pub use registry::{ConnectionHandle, SubscriptionRegistry, SubscriptionStore};
pub use stats::{MetricsCollector, NoopCollector, PrometheusCollector, RegistryStats};
