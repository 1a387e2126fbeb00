//! HTTP server for Translatron.
//!
//! Serves the `/trade` WebSocket RPC endpoint (one duplex stream per editor)
//! behind the auth middleware, plus optional static client assets.

mod auth;
mod rpc;
mod state;

use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub use auth::AuthedUser;
pub use state::SharedState;

/// Handle to a running HTTP server.
pub struct HttpServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<std::thread::JoinHandle<()>>,
}

impl HttpServerHandle {
    /// Check if the server is running.
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// Stop the server gracefully.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.join();
        }
    }
}

impl Default for HttpServerHandle {
    fn default() -> Self {
        Self {
            shutdown_tx: None,
            task: None,
        }
    }
}

/// Start the HTTP server on the given host and port.
///
/// The server runs in a separate thread with its own tokio runtime.
/// Returns a handle that can be used to stop the server.
pub fn start(
    state: Arc<SharedState>,
    host: String,
    port: u16,
    static_dir: Option<String>,
) -> Result<HttpServerHandle, String> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let task = std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime");

        rt.block_on(async move {
            let mut app = Router::new()
                .route("/trade", get(rpc::ws_handler))
                .layer(middleware::from_fn_with_state(
                    Arc::clone(&state),
                    auth::auth_middleware,
                ))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .with_state(state);

            // serve the editor's static assets if a directory was provided
            if let Some(dir) = static_dir {
                app = app.fallback_service(ServeDir::new(dir));
            }

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    log::error!("Failed to bind HTTP server to {}: {}", addr, e);
                    return;
                }
            };

            log::info!("HTTP server listening on http://{}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                    log::info!("HTTP server shutting down");
                })
                .await
                .ok();
        });
    });

    Ok(HttpServerHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

// ============================================================================
// TESTS
// ============================================================================
