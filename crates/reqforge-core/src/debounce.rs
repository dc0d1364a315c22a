//! Single-slot debounce timer.
//!
//! One pending task per slot: scheduling cancels and replaces whatever was
//! pending, so a burst of triggers collapses into one execution after the
//! quiet period. Tests drive it deterministically with tokio's paused
//! clock (`#[tokio::test(start_paused = true)]` + `tokio::time::advance`).

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// A cancellable, single-slot scheduled task.
pub struct DebounceSlot {
    quiet: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebounceSlot {
    /// Create a slot with the given quiet period.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `task` to run after the quiet period.
    ///
    /// Cancels any pending task first — there is never more than one
    /// timer in flight per slot.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let quiet = self.quiet;
        let mut pending = self.locked();
        if let Some(old) = pending.take() {
            old.abort();
        }
        *pending = Some(tokio::spawn(async move {
            sleep(quiet).await;
            task.await;
        }));
    }

    /// Cancel the pending task, if any.
    pub fn cancel(&self) {
        if let Some(pending) = self.locked().take() {
            pending.abort();
        }
    }

    /// Whether a task is currently pending or running.
    pub fn is_armed(&self) -> bool {
        self.locked()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for DebounceSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
