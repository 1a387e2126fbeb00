//! WebSocket RPC endpoint for collaborative editing.
//!
//! Each client holds one long-lived duplex stream, mounted at `/trade`.
//! Frames are JSON text:
//!
//! - request:  `{"id": 1, "method": "saveKey", "params": {...}}`
//! - response: `{"id": 1, "result": ...}` or `{"id": 1, "error": "..."}`
//! - push:     `{"eventType": "change", "payload": <ChangeEvent>}`
//!
//! A connection starts unregistered; the `register` handshake installs its
//! notify handle so peer mutations are pushed to it. Stream end (or an
//! unrecoverable dispatch fault) closes the connection and always
//! unregisters it. Method-level failures become error responses and never
//! tear the connection down.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use translatron_core::{ChangeEvent, SessionId};

use crate::auth::AuthedUser;
use crate::state::SharedState;

/// One request frame from the client.
#[derive(Debug, Deserialize)]
struct RpcRequest {
    id: u64,
    method: String,
    #[serde(default)]
    params: Value,
}

/// One response frame to the client.
#[derive(Debug, Serialize)]
struct RpcResponse {
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl RpcResponse {
    fn ok(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    fn fail(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Server-to-client push frame.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushFrame<'a> {
    event_type: &'a str,
    payload: &'a ChangeEvent,
}

/// Lifecycle of one connection. The Closed state is implicit: it is reached
/// by leaving the read loop, is terminal, and always unregisters the session.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ConnState {
    Connected,
    Registered,
}

// ----------------------------------------------------------------------------
// Method parameter shapes (camelCase, matching the client wire format)
// ----------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadProjectParams {
    project_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetDirectoryParams {
    path: String,
}

// `saveKey` historically also carried a redundant `id` argument; unknown
// fields are ignored, so old clients keep working.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveKeyParams {
    project_id: String,
    language: String,
    key: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameKeyParams {
    project_id: String,
    language: String,
    old_key: String,
    new_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveKeyParams {
    project_id: String,
    language: String,
    key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectParams {
    id: String,
    path: String,
    project_name: String,
    initial_languages: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDirectoryParams {
    id: String,
    directory_name: String,
    path: String,
}

/// Handler for GET /trade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<SharedState>>,
    user: Option<Extension<AuthedUser>>,
) -> impl IntoResponse {
    let identity = user.map(|Extension(u)| u.0);
    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Drive one client connection to completion.
async fn handle_socket(socket: WebSocket, state: Arc<SharedState>, identity: Option<String>) {
    let session_id = SessionId::new();
    log::info!(
        "session {} connected ({})",
        session_id,
        identity.as_deref().unwrap_or("-")
    );

    let (mut sink, mut stream) = socket.split();

    // All outbound frames (responses and pushes) funnel through one writer
    // task so the two producers never interleave partial writes.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut conn_state = ConnState::Connected;

    while let Some(incoming) = stream.next().await {
        let message = match incoming {
            Ok(message) => message,
            Err(e) => {
                log::warn!("session {session_id}: transport error: {e}");
                break;
            }
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // pings are answered by the library, binary frames are not part
            // of the protocol
            _ => continue,
        };

        let request: RpcRequest = match serde_json::from_str(&text) {
            Ok(request) => request,
            Err(e) => {
                // unrecoverable dispatch fault: close only this connection
                log::error!("session {session_id}: malformed frame: {e}");
                break;
            }
        };

        let response = if request.method == "register" {
            if conn_state == ConnState::Registered {
                log::debug!("session {session_id}: re-registered, replacing notify handle");
            }
            conn_state = ConnState::Registered;
            register(&state, &session_id, &out_tx);
            RpcResponse::ok(request.id, Value::Bool(true))
        } else {
            dispatch(&state, &session_id, request).await
        };

        let frame = match serde_json::to_string(&response) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("session {session_id}: cannot encode response: {e}");
                break;
            }
        };
        if out_tx.send(frame).is_err() {
            break;
        }
    }

    // terminal: no transition leaves Closed
    state.ops.notifier().unregister(&session_id);
    writer.abort();
    log::info!("session {session_id} disconnected ({conn_state:?})");
}

/// Install this connection's notify handle and forward pushed change events
/// into its writer. A replaced handle ends the previous forwarder naturally
/// once its sender is dropped from the registry.
fn register(state: &SharedState, session_id: &SessionId, out_tx: &mpsc::UnboundedSender<String>) {
    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<ChangeEvent>();
    state.ops.notifier().register(session_id.clone(), notify_tx);

    let out_tx = out_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = notify_rx.recv().await {
            let frame = PushFrame {
                event_type: "change",
                payload: &event,
            };
            let Ok(json) = serde_json::to_string(&frame) else {
                continue;
            };
            if out_tx.send(json).is_err() {
                break;
            }
        }
    });
}

/// Dispatch one parsed request to the operations façade.
async fn dispatch(state: &SharedState, origin: &SessionId, request: RpcRequest) -> RpcResponse {
    let RpcRequest { id, method, params } = request;
    log::debug!("session {origin}: {method}");

    let outcome = match method.as_str() {
        "loadProject" => dispatch_load_project(state, params).await,
        "getDirectory" => dispatch_get_directory(state, params).await,
        "saveKey" => dispatch_save_key(state, origin, params).await,
        "renameKey" => dispatch_rename_key(state, origin, params).await,
        "removeKey" => dispatch_remove_key(state, origin, params).await,
        "createNewProject" => dispatch_create_project(state, origin, params).await,
        "createNewDirectory" => dispatch_create_directory(state, origin, params).await,
        _ => Err(format!("unknown method: {method}")),
    };

    match outcome {
        Ok(result) => RpcResponse::ok(id, result),
        Err(error) => RpcResponse::fail(id, error),
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, String> {
    serde_json::from_value(params).map_err(|e| format!("invalid params: {e}"))
}

async fn dispatch_load_project(state: &SharedState, params: Value) -> Result<Value, String> {
    let p: LoadProjectParams = parse_params(params)?;
    let translations = state
        .ops
        .load_project(&p.project_id)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(translations).map_err(|e| e.to_string())
}

async fn dispatch_get_directory(state: &SharedState, params: Value) -> Result<Value, String> {
    let p: GetDirectoryParams = parse_params(params)?;
    let entries = state
        .ops
        .get_directory(&p.path)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(entries).map_err(|e| e.to_string())
}

async fn dispatch_save_key(
    state: &SharedState,
    origin: &SessionId,
    params: Value,
) -> Result<Value, String> {
    let p: SaveKeyParams = parse_params(params)?;
    state
        .ops
        .save_key(origin, &p.project_id, &p.language, &p.key, &p.value)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Value::Bool(true))
}

async fn dispatch_rename_key(
    state: &SharedState,
    origin: &SessionId,
    params: Value,
) -> Result<Value, String> {
    let p: RenameKeyParams = parse_params(params)?;
    state
        .ops
        .rename_key(origin, &p.project_id, &p.language, &p.old_key, &p.new_key)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Value::Bool(true))
}

async fn dispatch_remove_key(
    state: &SharedState,
    origin: &SessionId,
    params: Value,
) -> Result<Value, String> {
    let p: RemoveKeyParams = parse_params(params)?;
    state
        .ops
        .remove_key(origin, &p.project_id, &p.language, &p.key)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Value::Bool(true))
}

async fn dispatch_create_project(
    state: &SharedState,
    origin: &SessionId,
    params: Value,
) -> Result<Value, String> {
    let p: CreateProjectParams = parse_params(params)?;
    state
        .ops
        .create_project(origin, &p.id, &p.path, &p.project_name, &p.initial_languages)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Value::Bool(true))
}

async fn dispatch_create_directory(
    state: &SharedState,
    origin: &SessionId,
    params: Value,
) -> Result<Value, String> {
    let p: CreateDirectoryParams = parse_params(params)?;
    state
        .ops
        .create_directory(origin, &p.id, &p.directory_name, &p.path)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Value::Bool(true))
}

// ============================================================================
// TESTS
// ============================================================================
