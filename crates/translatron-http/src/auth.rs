//! Authentication middleware.
//!
//! An opaque gate in front of the RPC surface. The session layer only ever
//! observes the resulting identity's presence or absence, never the
//! mechanism.
//!
//! # Token Extraction
//!
//! Tokens can be provided in two ways:
//! 1. **Authorization header**: `Authorization: Bearer <token>`
//! 2. **Query parameter**: `?token=<token>` - used for WebSocket connections
//!    (which can't set headers)
//!
//! # Middleware Flow
//!
//! 1. If no auth token is configured on the server, requests pass through
//!    with no identity attached
//! 2. Otherwise, extract token from header (preferred) or query param
//! 3. On a match, attach the authenticated identity to the request
//! 4. Return 401 Unauthorized if the token is missing or invalid

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::SharedState;

/// Authenticated identity attached to requests that passed the token check.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

/// Extract bearer token from the Authorization header.
///
/// Returns None if the header is missing, malformed, or uses a different
/// auth scheme.
fn extract_bearer_token<B>(req: &axum::http::Request<B>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Extract a named value from the URL query string.
///
/// # Example URLs
/// - `/trade?token=abc123` -> Some("abc123")
/// - `/trade?foo=bar&token=abc123` -> Some("abc123")
/// - `/trade?foo=bar` -> None
fn extract_query_value<B>(req: &axum::http::Request<B>, wanted: &str) -> Option<String> {
    req.uri().query().and_then(|query| {
        query.split('&').find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next()?;
            if key == wanted {
                Some(value.to_string())
            } else {
                None
            }
        })
    })
}

/// Authentication middleware.
///
/// Checks for a valid token in the Authorization header, falling back to
/// the query string for WebSocket upgrade requests.
pub async fn auth_middleware(
    State(state): State<Arc<SharedState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // no auth configured: requests pass with identity absent
    if state.auth_token.is_none() {
        return next.run(req).await;
    }

    let header_token = extract_bearer_token(&req).map(|t| t.to_string());
    let query_token = extract_query_value(&req, "token");
    let token = header_token.or(query_token);

    if state.validate_token(token.as_deref()) {
        // clients may name themselves via ?user=; the core only cares that
        // an identity is present at all
        let name = extract_query_value(&req, "user").unwrap_or_else(|| "editor".to_string());
        req.extensions_mut().insert(AuthedUser(name));
        next.run(req).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid or missing authentication token",
        )
            .into_response()
    }
}

// ============================================================================
// TESTS
// ============================================================================
