//! ConsoleHub: admin console fan-out and session tracking
//!
//! ```text
//! OrderNotifier / admin handlers
//!       │ ConsoleMessage
//!       ▼
//! ConsoleHub
//!   ├── tx: broadcast::Sender<ConsoleMessage> (fan-out to every console)
//!   ├── sessions: session id → connected at (millis)
//!   └── watchers: watch::Sender<usize> (session count, read by the notifier)
//! ```

use dashmap::DashMap;
use shared::console::ConsoleMessage;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

/// Broadcast channel capacity
const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct ConsoleHub {
    tx: broadcast::Sender<ConsoleMessage>,
    sessions: Arc<DashMap<Uuid, i64>>,
    watchers: Arc<watch::Sender<usize>>,
}

impl Default for ConsoleHub {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (watchers, _) = watch::channel(0);
        Self {
            tx,
            sessions: Arc::new(DashMap::new()),
            watchers: Arc::new(watchers),
        }
    }
}

impl ConsoleHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleMessage> {
        self.tx.subscribe()
    }

    /// Broadcast to every connected console; no-op without subscribers
    pub fn publish(&self, msg: ConsoleMessage) {
        let _ = self.tx.send(msg);
    }

    /// Register an authenticated console. The session ends when the guard drops.
    pub fn connect(&self) -> ConsoleSession {
        let id = Uuid::new_v4();
        self.sessions.insert(id, shared::util::now_millis());
        self.sync_count();
        ConsoleSession {
            id,
            hub: self.clone(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Session count updates for the order notifier
    pub fn watch_sessions(&self) -> watch::Receiver<usize> {
        self.watchers.subscribe()
    }

    fn disconnect(&self, id: &Uuid) {
        self.sessions.remove(id);
        self.sync_count();
    }

    fn sync_count(&self) {
        let count = self.sessions.len();
        self.watchers.send_if_modified(|current| {
            if *current == count {
                false
            } else {
                *current = count;
                true
            }
        });
    }
}

/// Live admin console session
pub struct ConsoleSession {
    id: Uuid,
    hub: ConsoleHub,
}

impl ConsoleSession {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for ConsoleSession {
    fn drop(&mut self) {
        self.hub.disconnect(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_follow_guards() {
        let hub = ConsoleHub::new();
        let watch = hub.watch_sessions();

        let a = hub.connect();
        let b = hub.connect();
        assert_ne!(a.id(), b.id());
        assert_eq!(hub.session_count(), 2);
        assert_eq!(*watch.borrow(), 2);

        drop(a);
        assert_eq!(hub.session_count(), 1);
        assert_eq!(*watch.borrow(), 1);

        drop(b);
        assert_eq!(*watch.borrow(), 0);
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let hub = ConsoleHub::new();
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();

        hub.publish(ConsoleMessage::Ready {
            poll_interval_secs: 30,
        });

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                ConsoleMessage::Ready { poll_interval_secs } => assert_eq!(poll_interval_secs, 30),
                other => panic!("unexpected message: {other:?}"),
            }
        }
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let hub = ConsoleHub::new();
        hub.publish(ConsoleMessage::Ready {
            poll_interval_secs: 30,
        });
    }

    #[tokio::test]
    async fn watchers_see_transitions() {
        let hub = ConsoleHub::new();
        let mut watch = hub.watch_sessions();

        let session = hub.connect();
        watch.changed().await.unwrap();
        assert_eq!(*watch.borrow_and_update(), 1);

        drop(session);
        watch.changed().await.unwrap();
        assert_eq!(*watch.borrow_and_update(), 0);
    }
}
