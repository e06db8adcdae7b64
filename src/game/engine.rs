//! Repeating-task driver with a fresh random delay between runs.
//!
//! Each monster owns two of these (movement and state changes); the intervals
//! come from `config::game`. Cancellation is cooperative: a running callback
//! always completes, only the sleep between runs is interrupted.

use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::sleep;

pub struct RandomIntervalEngine {
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl RandomIntervalEngine {
    /// Spawns the driver task. `task` runs immediately, then again after a
    /// uniform random delay drawn from `interval_ms` before every further run.
    pub fn spawn<F, Fut>(interval_ms: Range<u64>, mut task: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());

        let handle = tokio::spawn({
            let cancelled = Arc::clone(&cancelled);
            let wake = Arc::clone(&wake);
            async move {
                loop {
                    if cancelled.load(Ordering::Acquire) {
                        break;
                    }
                    task().await;
                    let delay = rand::rng().random_range(interval_ms.clone());
                    tokio::select! {
                        _ = sleep(Duration::from_millis(delay)) => {}
                        _ = wake.notified() => {}
                    }
                }
            }
        });

        Self {
            cancelled,
            wake,
            handle,
        }
    }

    /// Requests the loop to stop. Idempotent; a callback already in progress
    /// finishes, but no further run starts.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        // Stored permit, so a sleeper that is not waiting yet still wakes.
        self.wake.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the driver task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RandomIntervalEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}
