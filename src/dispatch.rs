//! Inbound message dispatch
//!
//! Turns raw client payloads into registry calls. Anything that cannot be
//! acted on is reported back to the client on its error channel; the
//! dispatch call itself never fails.

use std::sync::Arc;

use crate::channel::ChannelSet;
use crate::config::Config;
use crate::conn::{Connection, ConnectionId, ConnectionWrapper};
use crate::error::{AuthError, Error, Result};
use crate::protocol::{InboundMessage, MessageType};
use crate::registry::{ConnectionHandle, SubscriptionStore};

/// Routes inbound messages to a subscription store
pub struct Dispatcher<S: SubscriptionStore> {
    store: Arc<S>,
    private_channels: ChannelSet,
    max_channels_per_message: usize,
}

impl<S: SubscriptionStore> Dispatcher<S> {
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        Self {
            store,
            private_channels: config.private_channels.clone(),
            max_channels_per_message: config.max_channels_per_message,
        }
    }

    /// Get a reference to the underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Decode, validate and apply one inbound message
    ///
    /// Failures are sent to the connection as error notifications and leave
    /// the store untouched.
    pub async fn parse_message(&self, connection: &Arc<Connection>, data: &[u8]) {
        if let Err(e) = self.apply(connection, data).await {
            tracing::debug!(conn = %connection.id(), error = %e, "Inbound message rejected");
            connection.send_error(e.to_result());
        }
    }

    /// Drop all subscriptions of a connection whose transport closed
    pub async fn remove(&self, id: &ConnectionId) {
        self.store.remove(id, None).await;
    }

    async fn apply(&self, connection: &Arc<Connection>, data: &[u8]) -> Result<()> {
        let message = InboundMessage::decode(data)?;

        let result = message.validate_with_limit(self.max_channels_per_message);
        if !result.is_valid() {
            return Err(Error::Invalid(result));
        }

        let channels = &message.params.channels;
        match message.message_type {
            MessageType::Subscribe => {
                if let Some(token) = message.params.token.as_deref() {
                    connection.authenticate(token)?;
                }

                if !connection.is_authenticated() {
                    if let Some(channel) = channels.iter().find(|c| self.private_channels.is_private(c)) {
                        return Err(AuthError::Required(channel.to_string()).into());
                    }
                }

                let handle: ConnectionHandle = connection.clone();
                self.store.subscribe(handle, channels).await;
            }
            MessageType::Unsubscribe => {
                self.store.unsubscribe(connection.id(), channels).await;
            }
            MessageType::Unknown => {
                tracing::trace!(conn = %connection.id(), "Ignoring unknown message type");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;
    use crate::channel::Channel;
    use crate::conn::{Authenticator, UserId};
    use crate::error::codes;
    use crate::registry::SubscriptionRegistry;
    use crate::stats::RegistryStats;

    fn config() -> Config {
        Config::default()
            .private_channel("notifications")
            .max_channels_per_message(4)
    }

    fn dispatcher() -> Dispatcher<SubscriptionRegistry> {
        Dispatcher::new(Arc::new(SubscriptionRegistry::new()), &config())
    }

    fn connection(id: &str) -> (Arc<Connection>, mpsc::Receiver<Bytes>) {
        let auth: Authenticator = Arc::new(|token: &str| match token.strip_prefix("token-") {
            Some(user) => Ok(UserId::new(user)),
            None => Err(AuthError::InvalidToken(token.to_string())),
        });
        let (conn, rx) = Connection::with_id(ConnectionId::from(id), &config());
        (Arc::new(conn.with_authenticator(auth)), rx)
    }

    fn error_code(rx: &mut mpsc::Receiver<Bytes>) -> String {
        let frame = rx.try_recv().expect("expected an error notification");
        let json: serde_json::Value = serde_json::from_slice(&frame).unwrap();
        assert_eq!(json["channel"], "error");
        json["data"]["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let dispatcher = dispatcher();
        let (conn, mut rx) = connection("c1");

        dispatcher
            .parse_message(&conn, br#"{"type":"subscribe","params":{"channels":["alerts","feed"]}}"#)
            .await;
        assert!(rx.try_recv().is_err());
        assert_eq!(dispatcher.store().channels(conn.id()).await.len(), 2);

        dispatcher
            .parse_message(&conn, br#"{"type":"unsubscribe","params":{"channels":["alerts"]}}"#)
            .await;
        assert_eq!(dispatcher.store().channels(conn.id()).await, vec![Channel::from("feed")]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_payload_sends_error() {
        let dispatcher = dispatcher();
        let (conn, mut rx) = connection("c1");

        dispatcher.parse_message(&conn, b"{not json").await;

        assert_eq!(error_code(&mut rx), codes::INVALID_MESSAGE);
        assert_eq!(dispatcher.store().stats().await, RegistryStats::default());
    }

    #[tokio::test]
    async fn test_validation_failure_sends_error() {
        let dispatcher = dispatcher();
        let (conn, mut rx) = connection("c1");

        dispatcher.parse_message(&conn, br#"{"type":"subscribe","params":{"channels":[]}}"#).await;
        assert_eq!(error_code(&mut rx), codes::VALIDATION_FAILED);

        dispatcher.parse_message(&conn, br#"{"type":"publish","params":{"channels":["feed"]}}"#).await;
        assert_eq!(error_code(&mut rx), codes::VALIDATION_FAILED);

        dispatcher
            .parse_message(&conn, br#"{"type":"subscribe","params":{"channels":["a","b","c","d","e"]}}"#)
            .await;
        assert_eq!(error_code(&mut rx), codes::VALIDATION_FAILED);

        assert_eq!(dispatcher.store().stats().await, RegistryStats::default());
    }

    #[tokio::test]
    async fn test_private_channel_requires_auth() {
        let dispatcher = dispatcher();
        let (conn, mut rx) = connection("c1");

        dispatcher
            .parse_message(&conn, br#"{"type":"subscribe","params":{"channels":["feed","notifications"]}}"#)
            .await;

        assert_eq!(error_code(&mut rx), codes::UNAUTHORIZED);
        assert!(dispatcher.store().channels(conn.id()).await.is_empty());
    }

    #[tokio::test]
    async fn test_private_subscribe_with_token() {
        let dispatcher = dispatcher();
        let (conn, mut rx) = connection("c1");

        dispatcher
            .parse_message(
                &conn,
                br#"{"type":"subscribe","params":{"channels":["notifications"],"token":"token-alice"}}"#,
            )
            .await;

        assert!(rx.try_recv().is_err());
        let found = dispatcher
            .store()
            .connection_by_user_id(&Channel::from("notifications"), &UserId::from("alice"))
            .await
            .unwrap();
        assert_eq!(found.id(), conn.id());
        assert_eq!(dispatcher.store().stats().await.private_connections, 1);
    }

    #[tokio::test]
    async fn test_bad_token_sends_error() {
        let dispatcher = dispatcher();
        let (conn, mut rx) = connection("c1");

        dispatcher
            .parse_message(&conn, br#"{"type":"subscribe","params":{"channels":["feed"],"token":"nope"}}"#)
            .await;

        assert_eq!(error_code(&mut rx), codes::UNAUTHORIZED);
        assert!(!conn.is_authenticated());
        assert_eq!(dispatcher.store().stats().await, RegistryStats::default());
    }

    #[test]
    fn test_remove_passthrough() {
        let dispatcher = dispatcher();
        let (conn, _rx) = connection("c1");

        tokio_test::block_on(async {
            dispatcher
                .parse_message(
                    &conn,
                    br#"{"type":"subscribe","params":{"channels":["notifications","feed"],"token":"token-bob"}}"#,
                )
                .await;
            assert_eq!(dispatcher.store().stats().await.open_connections, 1);

            dispatcher.remove(conn.id()).await;

            assert_eq!(dispatcher.store().stats().await, RegistryStats::default());
            assert!(dispatcher.store().connections(&Channel::from("feed")).await.is_empty());
        });
    }
}
