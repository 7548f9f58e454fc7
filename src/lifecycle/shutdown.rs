//! Shutdown coordination for the server.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Coordinator for graceful shutdown.
///
/// Couples the broadcast cancellation signal that handlers observe with the
/// in-flight set that `stop` drains. Clones share the same underlying state.
#[derive(Clone)]
pub struct Shutdown {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// A clone of the cancellation token, for embedding in request scopes.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Flip the shutdown signal. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has been triggered.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Register `fut` as in-flight work. The entry is released when the
    /// future completes or is dropped, so every exit path decrements,
    /// including panic unwinds.
    pub fn track<F: Future>(&self, fut: F) -> impl Future<Output = F::Output> {
        self.tracker.track_future(fut)
    }

    /// Number of tracked invocations still in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Close the in-flight set and wait for it to empty, up to `grace`.
    ///
    /// Returns `true` if everything finished, `false` if the deadline
    /// expired with work still running.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        tokio::time::timeout(grace, self.tracker.wait()).await.is_ok()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_is_observable_through_token() {
        let shutdown = Shutdown::new();
        let token = shutdown.token();
        assert!(!token.is_cancelled());
        shutdown.trigger();
        assert!(token.is_cancelled());
        // Awaiting an already-triggered signal resolves immediately.
        shutdown.cancelled().await;
    }

    #[tokio::test]
    async fn test_drain_waits_for_tracked_work() {
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(shutdown.track(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }));
        assert!(shutdown.drain(Duration::from_secs(1)).await);
        assert_eq!(shutdown.in_flight(), 0);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_gives_up_at_the_deadline() {
        let shutdown = Shutdown::new();
        let _stubborn = tokio::spawn(shutdown.track(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }));
        let start = std::time::Instant::now();
        assert!(!shutdown.drain(Duration::from_millis(50)).await);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(shutdown.in_flight(), 1);
    }
}
