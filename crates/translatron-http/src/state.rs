//! Shared state for the HTTP server.

use std::sync::Arc;
use translatron_core::Operations;

/// State available to all HTTP handlers.
pub struct SharedState {
    /// The operations façade every connection dispatches into.
    pub ops: Arc<Operations>,

    /// Shared auth token. `None` disables authentication entirely.
    pub auth_token: Option<String>,
}

impl SharedState {
    pub fn new(ops: Arc<Operations>, auth_token: Option<String>) -> Self {
        Self { ops, auth_token }
    }

    /// Validate a presented token against the configured one.
    /// With no token configured, everything validates.
    pub fn validate_token(&self, token: Option<&str>) -> bool {
        match (&self.auth_token, token) {
            (None, _) => true,
            (Some(expected), Some(presented)) => expected == presented,
            (Some(_), None) => false,
        }
    }
}
