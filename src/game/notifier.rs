//! Snapshot fan-out.
//!
//! One watch channel carries the latest `WorldSnapshot` to every subscriber.
//! Watch semantics match what renderers need: a slow reader skips straight to
//! the newest picture instead of replaying stale ones.

use log::debug;
use tokio::sync::watch;

use crate::game::types::WorldSnapshot;

pub struct ChangeNotifier {
    sender: watch::Sender<WorldSnapshot>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(WorldSnapshot::default());
        Self { sender }
    }

    /// Publishes `snapshot` as the current world picture, receivers or not.
    pub fn publish(&self, snapshot: WorldSnapshot) {
        debug!(
            "[Notifier] publish: {}",
            serde_json::to_string(&snapshot).unwrap_or_default()
        );
        self.sender.send_replace(snapshot);
    }

    pub fn subscribe(&self) -> watch::Receiver<WorldSnapshot> {
        self.sender.subscribe()
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> WorldSnapshot {
        self.sender.borrow().clone()
    }
}
