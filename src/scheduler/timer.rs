use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Handle to a one-shot deferred task armed with [`arm`].
///
/// Cancelling before the delay elapses revokes the task. Cancelling after it
/// started firing is a no-op: the fired work always runs to completion.
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Spawn a task that runs `on_fire` once `delay` has elapsed, unless the
/// returned handle is cancelled first.
pub fn arm<F, Fut>(delay: Duration, on_fire: F) -> TimerHandle
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = cancelled.cancelled() => {}
            _ = tokio::time::sleep(delay) => on_fire().await,
        }
    });

    TimerHandle { token }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let handle = arm(Duration::from_secs(60), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_delay_suppresses_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let handle = arm(Duration::from_secs(60), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        handle.cancel();
        assert!(handle.token.is_cancelled());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_fire_is_noop() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let handle = arm(Duration::from_secs(1), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.cancel();
        handle.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
