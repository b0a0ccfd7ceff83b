//! Single-slot cancellable delayed-task primitive.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Collapses rapid repeated triggers into one deferred task.
///
/// The slot holds at most one pending task: scheduling a new one aborts
/// whatever was pending, so only the last trigger within a quiet window
/// actually runs. Dropping the debouncer cancels the pending task.
pub struct Debouncer {
    window: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Create a debouncer with the standard auto-recalculation window.
    pub fn standard() -> Self {
        Self::new(obmin_common::time::constants::debounce_window())
    }

    /// Schedule `task` to run after the quiet window, cancelling any
    /// previously scheduled task.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            task.await;
        }));
    }

    /// Cancel the pending task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Cancelling pending debounced task");
            }
            handle.abort();
        }
    }

    /// Whether a task is scheduled and has not yet run.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_rapid_triggers_collapse_to_one() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        for _ in 0..5 {
            let counter = counter.clone();
            debouncer.schedule(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_new_trigger_cancels_pending() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(60));

        let first = hits.clone();
        debouncer.schedule(async move {
            first.store(100, Ordering::SeqCst);
        });

        // Re-trigger before the first window elapses.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = hits.clone();
        debouncer.schedule(async move {
            second.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_cancel() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(30));

        let inner = counter.clone();
        debouncer.schedule(async move {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.is_pending());

        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!debouncer.is_pending());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
