//! Cancellable delays and navigation generations.
//!
//! Timers never decide on their own whether their effect still applies.
//! They carry the [`Generation`] that armed them, and the pane compares it
//! with the current one before acting.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

/// A future that runs after a delay unless its owner drops it first.
#[derive(Debug)]
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    pub fn spawn<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        Self { handle }
    }

    /// Stop the task if it has not fired yet.
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Navigation counter of one pane. Generation 0 is "nothing loaded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub const NONE: Generation = Generation(0);

    pub fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct NavigationTracker {
    current: AtomicU64,
    armed: AtomicU64,
}

impl NavigationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new navigation; every earlier generation becomes stale.
    pub fn begin(&self) -> Generation {
        self.armed.store(0, Ordering::SeqCst);
        Generation(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Accept frame events for `generation` until it is disarmed.
    pub fn arm(&self, generation: Generation) {
        self.armed.store(generation.0, Ordering::SeqCst);
    }

    /// Stop accepting frame events, unless a newer navigation has armed since.
    pub fn disarm(&self, generation: Generation) {
        let _ = self
            .armed
            .compare_exchange(generation.0, 0, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// The generation a frame event belongs to, if a load is armed for the
    /// current navigation.
    pub fn armed(&self) -> Option<Generation> {
        let armed = self.armed.load(Ordering::SeqCst);
        let current = self.current.load(Ordering::SeqCst);
        (armed != 0 && armed == current).then_some(Generation(armed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_delayed_task_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let task = DelayedTask::spawn(Duration::from_secs(5), async move {
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(fired.load(Ordering::SeqCst));
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_task_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let task = DelayedTask::spawn(Duration::from_secs(5), async move {
            flag.store(true, Ordering::SeqCst);
        });
        drop(task);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_task_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let task = DelayedTask::spawn(Duration::from_secs(5), async move {
            flag.store(true, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        task.cancel();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_generations_go_stale() {
        let tracker = NavigationTracker::new();
        assert_eq!(tracker.current(), Generation::NONE);

        let first = tracker.begin();
        tracker.arm(first);
        assert_eq!(tracker.armed(), Some(first));

        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert_eq!(tracker.armed(), None);

        tracker.arm(first);
        assert_eq!(tracker.armed(), None);

        tracker.arm(second);
        tracker.disarm(first);
        assert_eq!(tracker.armed(), Some(second));
        tracker.disarm(second);
        assert_eq!(tracker.armed(), None);
    }
}
