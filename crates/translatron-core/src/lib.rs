//! # translatron-core
//!
//! Core business logic for Translatron, the collaborative localization
//! editor. Multiple editors manipulate a tree of translation projects on a
//! shared filesystem; every successful mutation is pushed live to all other
//! connected editors.
//!
//! This crate is framework-agnostic and is consumed by:
//! - the HTTP/WebSocket server (`translatron-http`)
//! - the daemon binary (`translatron-daemon`)
//!
//! ## Key Concepts
//!
//! - **Store**: file-backed CRUD for directories, projects, and per-language
//!   key/value documents
//! - **ChangesNotifier**: session registry and change-event fan-out
//! - **Operations**: the RPC-callable façade binding store and notifier
//! - **Session**: one live connection and its registered notify handle

pub mod events;
pub mod notifier;
pub mod ops;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use events::{ChangeEvent, ChangeKind};
pub use notifier::{ChangesNotifier, NotifyHandle};
pub use ops::Operations;
pub use session::SessionId;
pub use store::{DirEntry, ProjectTranslations, Store, StoreError};
