//! Subscription indices
//!
//! Three maps that together describe who is subscribed to what. They are
//! only ever mutated as a unit while the registry's write lock is held.
//!
//! Invariants after every mutation:
//! - `ch ∈ connection_channels[c]` iff `c ∈ channel_connections[ch]`
//! - no empty channel set in `connection_channels`, no empty subscriber map
//!   in `channel_connections`
//! - `user_connection[u] == c` only while `c` is present in
//!   `connection_channels`

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::channel::Channel;
use crate::conn::{ConnectionId, ConnectionWrapper, UserId};
use crate::stats::RegistryStats;

/// Shared handle stored for fan-out
pub type ConnectionHandle = Arc<dyn ConnectionWrapper>;

/// What a mutation did, for metrics and logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct Change {
    /// Any index was modified
    pub changed: bool,
    /// The connection entry was created
    pub connection_opened: bool,
    /// The connection entry was deleted
    pub connection_closed: bool,
    /// A user mapping was created
    pub private_opened: bool,
    /// A user mapping was deleted
    pub private_closed: bool,
}

#[derive(Default)]
pub(super) struct Indices {
    connection_channels: HashMap<ConnectionId, HashSet<Channel>>,
    channel_connections: HashMap<Channel, HashMap<ConnectionId, ConnectionHandle>>,
    user_connection: HashMap<UserId, ConnectionId>,
}

impl Indices {
    pub fn subscribe(&mut self, connection: &ConnectionHandle, channels: &[Channel]) -> Change {
        let mut change = Change::default();
        if channels.is_empty() {
            return change;
        }

        let id = connection.id();
        change.connection_opened = !self.connection_channels.contains_key(id);
        let subscribed = self.connection_channels.entry(id.clone()).or_default();

        for channel in channels {
            if subscribed.insert(channel.clone()) {
                change.changed = true;
            }
            self.channel_connections
                .entry(channel.clone())
                .or_default()
                .insert(id.clone(), Arc::clone(connection));
        }

        if let Some(user_id) = connection.user_id() {
            match self.user_connection.insert(user_id, id.clone()) {
                None => {
                    change.private_opened = true;
                    change.changed = true;
                }
                Some(previous) if previous != *id => change.changed = true,
                Some(_) => {}
            }
        }

        change
    }

    pub fn unsubscribe(&mut self, id: &ConnectionId, channels: &[Channel]) -> Change {
        let mut change = Change::default();
        let Some(subscribed) = self.connection_channels.get_mut(id) else {
            return change;
        };

        let mut handle = None;
        for channel in channels {
            if !subscribed.remove(channel) {
                continue;
            }
            change.changed = true;
            if let Some(removed) = detach(&mut self.channel_connections, channel, id) {
                handle = Some(removed);
            }
        }

        if subscribed.is_empty() {
            self.connection_channels.remove(id);
            change.connection_closed = true;
            if let Some(user_id) = handle.and_then(|h| h.user_id()) {
                change.private_closed = self.release_user(&user_id, id);
            }
        }

        change
    }

    pub fn unsubscribe_user_id(
        &mut self,
        id: &ConnectionId,
        user_id: &UserId,
        channel: &Channel,
    ) -> Change {
        let mut change = self.unsubscribe(id, std::slice::from_ref(channel));

        if !self.connection_channels.contains_key(id) && !change.private_closed {
            change.private_closed = self.release_user(user_id, id);
            change.changed |= change.private_closed;
        }

        change
    }

    pub fn remove(&mut self, id: &ConnectionId, user_id: Option<&UserId>) -> Change {
        let mut change = Change::default();
        let Some(subscribed) = self.connection_channels.remove(id) else {
            return change;
        };
        change.changed = true;
        change.connection_closed = true;

        let mut handle = None;
        for channel in &subscribed {
            if let Some(removed) = detach(&mut self.channel_connections, channel, id) {
                handle = Some(removed);
            }
        }

        let user_id = user_id.cloned().or_else(|| handle.and_then(|h| h.user_id()));
        if let Some(user_id) = user_id {
            change.private_closed = self.release_user(&user_id, id);
        }

        change
    }

    pub fn connections(&self, channel: &Channel) -> Vec<ConnectionHandle> {
        self.channel_connections
            .get(channel)
            .map(|subscribers| subscribers.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn connection_by_user_id(
        &self,
        channel: &Channel,
        user_id: &UserId,
    ) -> Option<ConnectionHandle> {
        let id = self.user_connection.get(user_id)?;
        self.channel_connections.get(channel)?.get(id).cloned()
    }

    pub fn channels(&self, id: &ConnectionId) -> Vec<Channel> {
        self.connection_channels
            .get(id)
            .map(|channels| channels.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, id: &ConnectionId, channel: &Channel) -> bool {
        self.connection_channels
            .get(id)
            .is_some_and(|channels| channels.contains(channel))
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            open_connections: self.connection_channels.len(),
            subscribed_channels: self.channel_connections.len(),
            private_connections: self.user_connection.len(),
        }
    }

    /// Drop the user mapping if it still points at `id`
    ///
    /// A newer connection for the same user keeps its mapping.
    fn release_user(&mut self, user_id: &UserId, id: &ConnectionId) -> bool {
        if self.user_connection.get(user_id) == Some(id) {
            self.user_connection.remove(user_id);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    pub fn assert_consistent(&self) {
        for (id, channels) in &self.connection_channels {
            assert!(!channels.is_empty(), "empty channel set kept for {}", id);
            for channel in channels {
                assert!(
                    self.channel_connections
                        .get(channel)
                        .is_some_and(|subs| subs.contains_key(id)),
                    "{} lists {} but the channel does not list it",
                    id,
                    channel
                );
            }
        }

        for (channel, subscribers) in &self.channel_connections {
            assert!(!subscribers.is_empty(), "empty subscriber map kept for {}", channel);
            for (id, handle) in subscribers {
                assert_eq!(handle.id(), id);
                assert!(
                    self.connection_channels
                        .get(id)
                        .is_some_and(|channels| channels.contains(channel)),
                    "{} lists {} but the connection does not list it",
                    channel,
                    id
                );
            }
        }

        for (user_id, id) in &self.user_connection {
            assert!(
                self.connection_channels.contains_key(id),
                "user {} mapped to closed connection {}",
                user_id,
                id
            );
        }
    }
}

/// Remove `id` from a channel's subscribers, pruning the channel if empty
fn detach(
    channel_connections: &mut HashMap<Channel, HashMap<ConnectionId, ConnectionHandle>>,
    channel: &Channel,
    id: &ConnectionId,
) -> Option<ConnectionHandle> {
    let subscribers = channel_connections.get_mut(channel)?;
    let removed = subscribers.remove(id);
    if subscribers.is_empty() {
        channel_connections.remove(channel);
    }
    removed
}
