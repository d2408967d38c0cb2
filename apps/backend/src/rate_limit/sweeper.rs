use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, warn};

use super::RateLimiter;

/// Periodically evict idle rate limit entries. The task stops when the
/// handle is aborted or the runtime shuts down.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; nothing is stale yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep();
            debug!(removed, remaining = limiter.len(), "rate limit sweep finished");
        }
    })
}

/// Wait for the sweeper task to end and report why. The sweeper never
/// returns on its own, so any exit is logged: a panic at error level, an
/// abort at warn level.
pub async fn watch_sweeper(handle: JoinHandle<()>) -> Result<(), JoinError> {
    match handle.await {
        Ok(()) => {
            warn!("rate limit sweeper stopped");
            Ok(())
        }
        Err(join_err) => {
            if join_err.is_panic() {
                error!(
                    error = %join_err,
                    "rate limit sweeper panicked; stale entries are no longer evicted"
                );
            } else {
                warn!("rate limit sweeper was aborted");
            }
            Err(join_err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::rate_limit::{Category, WindowPolicy};

    #[tokio::test]
    async fn sweeper_evicts_idle_entries() {
        let policies = HashMap::from([(
            Category::Upload,
            WindowPolicy::new(3, Duration::from_millis(10)),
        )]);
        let limiter = Arc::new(RateLimiter::new(policies, 2).unwrap());
        limiter.admit("198.51.100.1", Category::Upload);
        assert_eq!(limiter.len(), 1);

        let handle = spawn_sweeper(Arc::clone(&limiter), Duration::from_millis(15));
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        assert!(limiter.is_empty());
    }

    #[tokio::test]
    async fn watcher_reports_a_panicked_sweeper() {
        let handle = tokio::spawn(async {
            panic!("sweep failed");
        });

        let err = watch_sweeper(handle).await.unwrap_err();
        assert!(err.is_panic());
    }

    #[tokio::test]
    async fn watcher_reports_an_aborted_sweeper() {
        let limiter = Arc::new(RateLimiter::default());
        let handle = spawn_sweeper(limiter, Duration::from_secs(60));
        handle.abort();

        let err = watch_sweeper(handle).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
