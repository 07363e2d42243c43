//! Visibility-aware repeating task.
//!
//! A [`Poller`] invokes its task on a fixed schedule, but only while the
//! console is visible (terminal focused). Ticks that would fire while
//! hidden are skipped outright; regaining visibility never produces a
//! catch-up burst. The task future is awaited inside the loop, so a
//! long-running pass causes the next tick to be skipped rather than
//! overlapped.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Handle to a running poll schedule. Dropping the handle stops it.
pub struct Poller {
    cancel: CancellationToken,
}

impl Poller {
    /// Start polling. `visibility` gates each tick: the task only runs
    /// when the latest value is `true`.
    ///
    /// `stop()` (or drop) cancels the schedule; an in-flight task pass is
    /// aborted, so its result can never mutate state after teardown.
    pub fn start<F, Fut>(
        interval: Duration,
        visibility: watch::Receiver<bool>,
        mut task: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Don't burst ticks if we fall behind or were hidden.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if !*visibility.borrow() {
                            continue;
                        }
                        tokio::select! {
                            biased;
                            _ = task_cancel.cancelled() => break,
                            () = task() => {}
                        }
                    }
                }
            }

            tracing::debug!("poller stopped");
        });

        Self { cancel }
    }

    /// Cancel the schedule.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_once_per_interval_while_visible() {
        let (_tx, rx) = watch::channel(true);
        let count = Arc::new(AtomicUsize::new(0));

        let task_count = Arc::clone(&count);
        let poller = Poller::start(Duration::from_secs(30), rx, move || {
            let c = Arc::clone(&task_count);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_ticks_are_skipped_without_burst() {
        let (tx, rx) = watch::channel(false);
        let count = Arc::new(AtomicUsize::new(0));

        let task_count = Arc::clone(&count);
        let _poller = Poller::start(Duration::from_secs(30), rx, move || {
            let c = Arc::clone(&task_count);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        // Hidden for three full intervals: nothing runs.
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Visible again: exactly one run per interval, no catch-up.
        tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_ticks_are_skipped() {
        let (_tx, rx) = watch::channel(true);
        let count = Arc::new(AtomicUsize::new(0));

        // Each pass takes 45s against a 30s interval.
        let task_count = Arc::clone(&count);
        let _poller = Poller::start(Duration::from_secs(30), rx, move || {
            let c = Arc::clone(&task_count);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(45)).await;
            }
        });

        // Passes start at t=30 and t=90; the t=60 tick lands mid-pass
        // and is skipped.
        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_aborts_in_flight_pass() {
        let (_tx, rx) = watch::channel(true);
        let finished = Arc::new(AtomicUsize::new(0));

        let task_finished = Arc::clone(&finished);
        let poller = Poller::start(Duration::from_secs(10), rx, move || {
            let f = Arc::clone(&task_finished);
            async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                f.fetch_add(1, Ordering::SeqCst);
            }
        });

        // A pass starts at t=10; stop at t=20 while it sleeps.
        tokio::time::sleep(Duration::from_secs(20)).await;
        poller.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
