//! Change-notification fan-out.
//!
//! Decouples "who changed what" from "who must be told": a registry mapping
//! session id to a remote notify handle. The registry is owned by one
//! coordinator and injected into each connection handler; connection tasks
//! run on a multi-threaded runtime, so it is guarded by a mutex.

use crate::events::ChangeEvent;
use crate::session::SessionId;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Remote notification handle for one registered session.
pub type NotifyHandle = mpsc::UnboundedSender<ChangeEvent>;

/// Registry of live sessions and their notify handles.
#[derive(Default)]
pub struct ChangesNotifier {
    sessions: Mutex<HashMap<SessionId, NotifyHandle>>,
}

impl ChangesNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the handle for a session.
    pub fn register(&self, session_id: SessionId, handle: NotifyHandle) {
        self.sessions.lock().unwrap().insert(session_id, handle);
    }

    /// Remove a session. Safe to call repeatedly or on an unknown id.
    pub fn unregister(&self, session_id: &SessionId) {
        self.sessions.lock().unwrap().remove(session_id);
    }

    /// Deliver `event` to every registered session except the origin.
    ///
    /// Delivery is fire-and-forget: a failed send (receiver already gone)
    /// is logged and never surfaced to the caller, and does not affect
    /// delivery to the remaining sessions. Returns the number of sessions
    /// the event was handed to.
    pub fn broadcast(&self, origin: &SessionId, event: &ChangeEvent) -> usize {
        let sessions = self.sessions.lock().unwrap();
        let mut delivered = 0;
        for (id, handle) in sessions.iter() {
            if id == origin {
                continue;
            }
            if handle.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                log::debug!("dropping change event for stale session {id}");
            }
        }
        delivered
    }

    /// Number of currently registered sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeKind;
    use serde_json::json;

    fn make_event() -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::KeyAdded,
            project_id: "demo".to_string(),
            language: Some("en".to_string()),
            path: "greeting".to_string(),
            payload: json!({"key": "greeting", "value": "Hello"}),
        }
    }

    #[test]
    fn register_increments_count() {
        let notifier = ChangesNotifier::new();
        assert_eq!(notifier.session_count(), 0);

        let (tx, _rx) = mpsc::unbounded_channel();
        notifier.register(SessionId::new(), tx);
        assert_eq!(notifier.session_count(), 1);
    }

    #[test]
    fn register_overwrites_existing_handle() {
        let notifier = ChangesNotifier::new();
        let id = SessionId::new();
        let peer = SessionId::new();

        let (old_tx, mut old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        notifier.register(id.clone(), old_tx);
        notifier.register(id.clone(), new_tx);
        assert_eq!(notifier.session_count(), 1);

        notifier.broadcast(&peer, &make_event());
        assert!(new_rx.try_recv().is_ok());
        assert!(old_rx.try_recv().is_err());
    }

    #[test]
    fn unregister_unknown_is_noop() {
        let notifier = ChangesNotifier::new();
        let id = SessionId::new();
        notifier.unregister(&id);
        notifier.unregister(&id);
        assert_eq!(notifier.session_count(), 0);
    }

    #[test]
    fn broadcast_skips_origin() {
        let notifier = ChangesNotifier::new();
        let origin = SessionId::new();
        let peer = SessionId::new();

        let (origin_tx, mut origin_rx) = mpsc::unbounded_channel();
        let (peer_tx, mut peer_rx) = mpsc::unbounded_channel();
        notifier.register(origin.clone(), origin_tx);
        notifier.register(peer.clone(), peer_tx);

        let delivered = notifier.broadcast(&origin, &make_event());
        assert_eq!(delivered, 1);
        assert!(peer_rx.try_recv().is_ok());
        assert!(origin_rx.try_recv().is_err());
    }

    #[test]
    fn broadcast_with_no_peers_delivers_nothing() {
        let notifier = ChangesNotifier::new();
        let origin = SessionId::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        notifier.register(origin.clone(), tx);

        assert_eq!(notifier.broadcast(&origin, &make_event()), 0);
    }

    #[test]
    fn stale_handle_does_not_affect_others() {
        let notifier = ChangesNotifier::new();
        let origin = SessionId::new();
        let stale = SessionId::new();
        let live = SessionId::new();

        let (stale_tx, stale_rx) = mpsc::unbounded_channel();
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        notifier.register(stale.clone(), stale_tx);
        notifier.register(live.clone(), live_tx);
        drop(stale_rx);

        let delivered = notifier.broadcast(&origin, &make_event());
        assert_eq!(delivered, 1);
        assert!(live_rx.try_recv().is_ok());
    }

    #[test]
    fn unregistered_session_receives_nothing() {
        let notifier = ChangesNotifier::new();
        let origin = SessionId::new();
        let gone = SessionId::new();

        let (tx, mut rx) = mpsc::unbounded_channel();
        notifier.register(gone.clone(), tx);
        notifier.unregister(&gone);

        notifier.broadcast(&origin, &make_event());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn events_arrive_in_broadcast_order() {
        let notifier = ChangesNotifier::new();
        let origin = SessionId::new();
        let peer = SessionId::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        notifier.register(peer.clone(), tx);

        for value in ["one", "two", "three"] {
            let mut event = make_event();
            event.payload = json!({"value": value});
            notifier.broadcast(&origin, &event);
        }

        assert_eq!(rx.try_recv().unwrap().payload["value"], "one");
        assert_eq!(rx.try_recv().unwrap().payload["value"], "two");
        assert_eq!(rx.try_recv().unwrap().payload["value"], "three");
    }
}
