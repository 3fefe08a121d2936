use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Counts failed authentications per client and blocks a client that reaches
/// `max_failures` until its window elapses.
#[derive(Clone)]
pub struct AuthFailureLimiter {
    inner: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_failures: u32,
    window: Duration,
}

impl AuthFailureLimiter {
    pub fn new(max_failures: u32, window_seconds: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_failures: max_failures.max(1),
            window: Duration::from_secs(window_seconds),
        }
    }

    /// Returns true once the client is blocked.
    pub async fn record_failure(&self, client: &str) -> bool {
        let mut guard = self.inner.lock().await;
        let now = Instant::now();
        let (count, reset_at) = guard
            .entry(client.to_string())
            .or_insert((0, now + self.window));
        if now >= *reset_at {
            *count = 0;
            *reset_at = now + self.window;
        }
        *count += 1;
        *count >= self.max_failures
    }

    pub async fn is_blocked(&self, client: &str) -> bool {
        let mut guard = self.inner.lock().await;
        if let Some((count, reset_at)) = guard.get(client) {
            if Instant::now() >= *reset_at {
                guard.remove(client);
                return false;
            }
            return *count >= self.max_failures;
        }
        false
    }

    pub async fn clear(&self, client: &str) {
        self.inner.lock().await.remove(client);
    }

    /// Drops entries whose window has passed.
    pub async fn cleanup_expired(&self) {
        let now = Instant::now();
        self.inner.lock().await.retain(|_, (_, reset_at)| now < *reset_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocks_at_threshold() {
        let limiter = AuthFailureLimiter::new(3, 60);
        assert!(!limiter.record_failure("a").await);
        assert!(!limiter.record_failure("a").await);
        assert!(!limiter.is_blocked("a").await);
        assert!(limiter.record_failure("a").await);
        assert!(limiter.is_blocked("a").await);
        assert!(!limiter.is_blocked("b").await);
    }

    #[tokio::test]
    async fn test_window_expiry_unblocks() {
        let limiter = AuthFailureLimiter::new(1, 0);
        assert!(limiter.record_failure("a").await);
        assert!(!limiter.is_blocked("a").await);
    }

    #[tokio::test]
    async fn test_clear_resets_count() {
        let limiter = AuthFailureLimiter::new(2, 60);
        limiter.record_failure("a").await;
        limiter.clear("a").await;
        assert!(!limiter.record_failure("a").await);
    }
}
