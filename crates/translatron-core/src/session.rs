//! Session identity.
//!
//! A session is one live connection. It is created when the transport stream
//! opens, optionally registers a notify handle (the handshake), and is gone
//! when the stream ends. Sessions are never persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connected session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
