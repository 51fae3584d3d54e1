//! Connection handles
//!
//! The registry only needs two things from a connection: a stable id and,
//! for private subscriptions, the id of the user that owns it. Fan-out code
//! additionally needs to queue frames. Those are the `ConnectionWrapper`
//! capabilities. `Connection` is the concrete handle a
//! transport creates per client; it also carries the outbound queue used for
//! error notifications and the authentication hook.

pub mod connection;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use connection::{Authenticator, Connection};

/// Identifier of a live connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random connection id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Capabilities the registry needs from a connection
///
/// The registry holds `Arc<dyn ConnectionWrapper>` handles for fan-out but
/// never owns or closes the underlying transport.
pub trait ConnectionWrapper: Send + Sync {
    /// Stable id of the connection
    fn id(&self) -> &ConnectionId;

    /// Owning user, if the connection is authenticated
    fn user_id(&self) -> Option<UserId>;

    /// Queue an encoded frame for delivery without waiting
    ///
    /// Used by fan-out code; the registry itself never calls it.
    fn send(&self, frame: Bytes) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ConnectionId::from("conn-1").to_string(), "conn-1");
        assert_eq!(UserId::from("user-1").to_string(), "user-1");
    }
}
