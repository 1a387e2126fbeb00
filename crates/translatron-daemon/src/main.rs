//! Translatron daemon.
//!
//! Hosts the collaborative localization backend: the file-backed project
//! store, the change-notification fan-out, and the `/trade` WebSocket RPC
//! endpoint. Runs until interrupted.

use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use translatron_core::{ChangesNotifier, Operations, Store};
use translatron_http::SharedState;

#[derive(Parser, Debug)]
#[command(name = "translatron-daemon", about = "Collaborative localization server")]
struct Args {
    /// Host interface to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Root directory for project storage (created if missing).
    #[arg(long, default_value = "./static")]
    root: String,

    /// Directory of static client assets to serve.
    #[arg(long)]
    static_dir: Option<String>,

    /// Shared auth token. When unset, authentication is disabled.
    #[arg(long)]
    auth_token: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = std::fs::create_dir_all(&args.root) {
        log::error!("cannot create storage root {}: {}", args.root, e);
        std::process::exit(1);
    }

    let notifier = Arc::new(ChangesNotifier::new());
    let ops = Arc::new(Operations::new(Store::new(Path::new(&args.root)), notifier));
    let state = Arc::new(SharedState::new(ops, args.auth_token));

    let mut handle = match translatron_http::start(state, args.host, args.port, args.static_dir) {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    tokio::signal::ctrl_c().await.ok();
    log::info!("interrupt received, shutting down");
    handle.stop();
}
