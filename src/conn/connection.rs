//! Concrete connection handle

use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::Config;
use crate::error::AuthError;
use crate::protocol::{OutboundMessage, ValidationResult};

use super::{ConnectionId, ConnectionWrapper, UserId};

/// Resolves an auth token into the user that owns it
pub type Authenticator = Arc<dyn Fn(&str) -> Result<UserId, AuthError> + Send + Sync>;

/// Handle for a single client connection
///
/// The transport owns the receiving half of the outbound queue and writes
/// every frame it yields to the socket.
pub struct Connection {
    id: ConnectionId,
    user_id: OnceLock<UserId>,
    outbound: mpsc::Sender<Bytes>,
    authenticator: Option<Authenticator>,
}

impl Connection {
    /// Create a connection with a generated id
    ///
    /// Returns the handle and the receiver for outbound frames.
    pub fn new(config: &Config) -> (Self, mpsc::Receiver<Bytes>) {
        Self::with_id(ConnectionId::generate(), config)
    }

    /// Create a connection with a caller-supplied id
    pub fn with_id(id: ConnectionId, config: &Config) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(config.outbound_buffer_size.max(1));

        let connection = Self {
            id,
            user_id: OnceLock::new(),
            outbound: tx,
            authenticator: None,
        };

        (connection, rx)
    }

    /// Install the hook used to resolve auth tokens
    pub fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Bind the connection to a user up front (e.g. from a handshake header)
    pub fn with_user_id(self, user_id: UserId) -> Self {
        let _ = self.user_id.set(user_id);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.get().is_some()
    }

    /// Authenticate with a token
    ///
    /// A connection is bound to at most one user. Re-authenticating as the
    /// same user succeeds; a different user is rejected.
    pub fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        let authenticator = self.authenticator.as_ref().ok_or(AuthError::Unsupported)?;
        let user_id = authenticator(token)?;

        let bound = self.user_id.get_or_init(|| user_id.clone());
        if *bound != user_id {
            return Err(AuthError::UserMismatch);
        }

        tracing::debug!(conn = %self.id, user = %user_id, "Connection authenticated");
        Ok(user_id)
    }

    /// Queue a frame without waiting
    ///
    /// Returns false when the frame was dropped because the queue is full or
    /// the transport has gone away.
    pub fn send(&self, frame: Bytes) -> bool {
        match self.outbound.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(conn = %self.id, "Outbound queue full, frame dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(conn = %self.id, "Outbound queue closed, frame dropped");
                false
            }
        }
    }

    /// Notify the client of an error on the error channel
    pub fn send_error(&self, result: ValidationResult) {
        match OutboundMessage::error(result).encode() {
            Ok(frame) => {
                self.send(frame);
            }
            Err(e) => {
                tracing::error!(conn = %self.id, error = %e, "Failed to encode error notification");
            }
        }
    }
}

impl ConnectionWrapper for Connection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    fn user_id(&self) -> Option<UserId> {
        self.user_id.get().cloned()
    }

    fn send(&self, frame: Bytes) -> bool {
        Connection::send(self, frame)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id.get())
            .field("authenticator", &self.authenticator.is_some())
            .finish()
    }
}
