//! Poll loop shared by the readiness and element-condition waits

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::Result;

/// Evaluate `condition` every `interval` until it holds or `timeout` elapses
///
/// The condition is checked at least once, even with a zero timeout. Transient errors
/// (see [`Error::is_transient`](crate::Error::is_transient)) count as "not yet"; any other
/// error is returned immediately. `Ok(false)` means the budget ran out.
pub(crate) async fn poll_until<F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut condition: F,
) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        match condition().await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) if e.is_transient() => debug!("Transient error while polling: {}", e),
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_condition_met_after_some_ticks() {
        let counter = AtomicUsize::new(0);
        let ticks = &counter;
        let started = Instant::now();

        let met = poll_until(Duration::from_secs(1), Duration::from_millis(100), move || async move {
            Ok(ticks.fetch_add(1, Ordering::SeqCst) >= 3)
        })
        .await
        .unwrap();

        assert!(met);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_false() {
        let started = Instant::now();

        let met = poll_until(Duration::from_millis(250), Duration::from_millis(100), move || async move {
            Ok(false)
        })
        .await
        .unwrap();

        assert!(!met);
        assert_eq!(started.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_checks_once() {
        let counter = AtomicUsize::new(0);
        let ticks = &counter;

        let met = poll_until(Duration::ZERO, Duration::from_millis(100), move || async move {
            ticks.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        })
        .await
        .unwrap();

        assert!(!met);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_polling() {
        let counter = AtomicUsize::new(0);
        let ticks = &counter;

        let met = poll_until(Duration::from_secs(1), Duration::from_millis(100), move || async move {
            match ticks.fetch_add(1, Ordering::SeqCst) {
                0 => Err(Error::stale_element("el-1")),
                1 => Err(Error::element_not_found(".item")),
                _ => Ok(true),
            }
        })
        .await
        .unwrap();

        assert!(met);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_abort() {
        let counter = AtomicUsize::new(0);
        let ticks = &counter;

        let result = poll_until(Duration::from_secs(1), Duration::from_millis(100), move || async move {
            ticks.fetch_add(1, Ordering::SeqCst);
            Err::<bool, _>(Error::cdp("Target closed"))
        })
        .await;

        assert!(matches!(result, Err(Error::Cdp(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
