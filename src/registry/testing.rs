//! Test doubles shared by registry and dispatcher tests

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::channel::Channel;
use crate::conn::{ConnectionId, ConnectionWrapper, UserId};
use crate::stats::{MetricsCollector, RegistryStats};

use super::index::ConnectionHandle;

pub(crate) struct TestConnection {
    id: ConnectionId,
    user_id: Option<UserId>,
}

impl TestConnection {
    pub fn public(id: &str) -> ConnectionHandle {
        Arc::new(Self {
            id: ConnectionId::from(id),
            user_id: None,
        })
    }

    pub fn private(id: &str, user_id: &str) -> ConnectionHandle {
        Arc::new(Self {
            id: ConnectionId::from(id),
            user_id: Some(UserId::from(user_id)),
        })
    }
}

impl ConnectionWrapper for TestConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    fn user_id(&self) -> Option<UserId> {
        self.user_id.clone()
    }

    fn send(&self, _frame: Bytes) -> bool {
        true
    }
}

pub(crate) fn channels(names: &[&str]) -> Vec<Channel> {
    names.iter().map(|name| Channel::from(*name)).collect()
}

/// Collector that records every call
#[derive(Default)]
pub(crate) struct RecordingCollector {
    pub open_connections: AtomicUsize,
    pub subscribed_channels: AtomicUsize,
    pub private_connections: AtomicUsize,
    /// Running balance of inc/dec events
    pub private_gauge: AtomicI64,
    /// Total number of calls of any kind
    pub calls: AtomicUsize,
}

impl RecordingCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gauges(&self) -> RegistryStats {
        RegistryStats {
            open_connections: self.open_connections.load(Ordering::SeqCst),
            subscribed_channels: self.subscribed_channels.load(Ordering::SeqCst),
            private_connections: self.private_connections.load(Ordering::SeqCst),
        }
    }

    pub fn private_gauge(&self) -> i64 {
        self.private_gauge.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetricsCollector for RecordingCollector {
    fn open_connections(&self, count: usize) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.open_connections.store(count, Ordering::SeqCst);
    }

    fn subscribed_channels(&self, count: usize) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.subscribed_channels.store(count, Ordering::SeqCst);
    }

    fn private_connections(&self, count: usize) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.private_connections.store(count, Ordering::SeqCst);
    }

    fn private_connections_inc(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.private_gauge.fetch_add(1, Ordering::SeqCst);
    }

    fn private_connections_dec(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.private_gauge.fetch_sub(1, Ordering::SeqCst);
    }
}
