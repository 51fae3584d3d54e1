//! Subscription registry implementation
//!
//! The central registry that tracks which connections subscribe to which
//! channels and which user owns which connection.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::channel::Channel;
use crate::conn::{ConnectionId, UserId};
use crate::stats::{MetricsCollector, NoopCollector, RegistryStats};

use super::index::{Change, ConnectionHandle, Indices};

/// Registry operations the dispatcher relies on
pub trait SubscriptionStore: Send + Sync {
    /// Subscribe a connection to channels
    fn subscribe(
        &self,
        connection: ConnectionHandle,
        channels: &[Channel],
    ) -> impl Future<Output = ()> + Send;

    /// Unsubscribe a connection from channels
    fn unsubscribe(&self, id: &ConnectionId, channels: &[Channel])
        -> impl Future<Output = ()> + Send;

    /// Drop every subscription of a connection
    fn remove(&self, id: &ConnectionId, user_id: Option<&UserId>)
        -> impl Future<Output = ()> + Send;
}

/// Central registry for all subscriptions
///
/// All three indices sit behind a single `RwLock` so that every mutation is
/// one critical section. Metrics are reported while the write guard is
/// held.
pub struct SubscriptionRegistry {
    indices: RwLock<Indices>,

    collector: Arc<dyn MetricsCollector>,
}

impl SubscriptionRegistry {
    /// Create a registry that discards metrics
    pub fn new() -> Self {
        Self::with_collector(Arc::new(NoopCollector))
    }

    /// Create a registry reporting to `collector`
    pub fn with_collector(collector: Arc<dyn MetricsCollector>) -> Self {
        Self {
            indices: RwLock::new(Indices::default()),
            collector,
        }
    }

    /// Subscribe a connection to channels
    ///
    /// Creates the connection's footprint on first use. If the connection
    /// belongs to a user it becomes that user's registered connection,
    /// replacing any earlier one. Channels already subscribed are skipped.
    pub async fn subscribe(&self, connection: ConnectionHandle, channels: &[Channel]) {
        let mut indices = self.indices.write().await;
        let change = indices.subscribe(&connection, channels);
        self.report(&indices, change);

        tracing::debug!(
            conn = %connection.id(),
            user = ?connection.user_id(),
            channels = channels.len(),
            new_connection = change.connection_opened,
            "Subscribed"
        );
    }

    /// Unsubscribe a connection from channels
    ///
    /// Unknown connections and channels are ignored. When the last channel
    /// goes the connection is closed and its user mapping released.
    pub async fn unsubscribe(&self, id: &ConnectionId, channels: &[Channel]) {
        let mut indices = self.indices.write().await;
        let change = indices.unsubscribe(id, channels);
        self.report(&indices, change);

        if change.changed {
            tracing::debug!(
                conn = %id,
                channels = channels.len(),
                closed = change.connection_closed,
                "Unsubscribed"
            );
        }
    }

    /// Unsubscribe a user's connection from one channel
    ///
    /// The user mapping is released only once the connection has no
    /// channels left; while other subscriptions remain it stays intact.
    pub async fn unsubscribe_user_id(&self, id: &ConnectionId, user_id: &UserId, channel: &Channel) {
        let mut indices = self.indices.write().await;
        let change = indices.unsubscribe_user_id(id, user_id, channel);
        self.report(&indices, change);

        if change.changed {
            tracing::debug!(
                conn = %id,
                user = %user_id,
                channel = %channel,
                released = change.private_closed,
                "Unsubscribed user"
            );
        }
    }

    /// Remove a connection and all of its subscriptions
    ///
    /// Only the channels the connection occupies are touched. Safe to call
    /// for a connection that is already gone.
    pub async fn remove(&self, id: &ConnectionId, user_id: Option<&UserId>) {
        let mut indices = self.indices.write().await;
        let change = indices.remove(id, user_id);
        self.report(&indices, change);

        if change.changed {
            tracing::debug!(conn = %id, user = ?user_id, "Connection removed");
        }
    }

    /// Snapshot of the current subscribers of a channel
    ///
    /// Empty for unknown channels. Order is unspecified.
    pub async fn connections(&self, channel: &Channel) -> Vec<ConnectionHandle> {
        self.indices.read().await.connections(channel)
    }

    /// The user's registered connection, if it subscribes to `channel`
    pub async fn connection_by_user_id(
        &self,
        channel: &Channel,
        user_id: &UserId,
    ) -> Option<ConnectionHandle> {
        self.indices.read().await.connection_by_user_id(channel, user_id)
    }

    /// Channels a connection subscribes to
    pub async fn channels(&self, id: &ConnectionId) -> Vec<Channel> {
        self.indices.read().await.channels(id)
    }

    /// Check whether a connection subscribes to a channel
    pub async fn is_subscribed(&self, id: &ConnectionId, channel: &Channel) -> bool {
        self.indices.read().await.is_subscribed(id, channel)
    }

    /// Current index sizes
    pub async fn stats(&self) -> RegistryStats {
        self.indices.read().await.stats()
    }

    fn report(&self, indices: &Indices, change: Change) {
        if !change.changed {
            return;
        }

        if change.private_opened {
            self.collector.private_connections_inc();
        }
        if change.private_closed {
            self.collector.private_connections_dec();
        }

        let stats = indices.stats();
        self.collector.open_connections(stats.open_connections);
        self.collector.subscribed_channels(stats.subscribed_channels);
        self.collector.private_connections(stats.private_connections);
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionStore for SubscriptionRegistry {
    async fn subscribe(&self, connection: ConnectionHandle, channels: &[Channel]) {
        SubscriptionRegistry::subscribe(self, connection, channels).await
    }

    async fn unsubscribe(&self, id: &ConnectionId, channels: &[Channel]) {
        SubscriptionRegistry::unsubscribe(self, id, channels).await
    }

    async fn remove(&self, id: &ConnectionId, user_id: Option<&UserId>) {
        SubscriptionRegistry::remove(self, id, user_id).await
    }
}
