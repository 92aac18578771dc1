use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Upper bound and probe cadence for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// The condition never held within the policy's timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("condition not met within {timeout:?} ({attempts} probes)")]
pub struct WaitTimeout {
    pub timeout: Duration,
    pub attempts: u32,
}

/// Probe until it yields a value or the policy's timeout elapses.
///
/// The probe always runs at least once, and once more after the deadline
/// passes, so a condition that becomes true during the last interval is not
/// missed. A timeout too large to add to the clock never expires.
pub async fn poll_until<T, F, Fut>(policy: WaitPolicy, mut probe: F) -> Result<T, WaitTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now().checked_add(policy.timeout);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if let Some(value) = probe().await {
            return Ok(value);
        }

        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(WaitTimeout {
                        timeout: policy.timeout,
                        attempts,
                    });
                }
                policy.interval.min(deadline - now)
            }
            None => policy.interval,
        };

        sleep(pause).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(timeout_ms: u64, interval_ms: u64) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(interval_ms),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn returns_as_soon_as_probe_succeeds() {
        let calls = AtomicU32::new(0);
        let value = poll_until(policy(10_000, 500), || async {
            let seen = calls.fetch_add(1, Ordering::SeqCst) + 1;
            (seen == 3).then_some(seen)
        })
        .await
        .expect("third probe succeeds");

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_timeout() {
        let started = Instant::now();
        let error = poll_until(policy(2_000, 500), || async { None::<()> })
            .await
            .expect_err("condition never holds");

        assert_eq!(error.timeout, Duration::from_millis(2_000));
        // probes at 0, 500, 1000, 1500 and 2000 ms
        assert_eq!(error.attempts, 5);
        assert_eq!(started.elapsed(), Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_probes_exactly_once() {
        let calls = AtomicU32::new(0);
        let error = poll_until(policy(0, 500), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            None::<()>
        })
        .await
        .expect_err("no time to wait");

        assert_eq!(error.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_timeout_keeps_polling_instead_of_overflowing() {
        let calls = AtomicU32::new(0);
        let policy = WaitPolicy::new(Duration::from_secs(u64::MAX), Duration::from_millis(1));
        let value = poll_until(policy, || async {
            let seen = calls.fetch_add(1, Ordering::SeqCst) + 1;
            (seen == 2).then_some(seen)
        })
        .await
        .expect("second probe succeeds");

        assert_eq!(value, 2);
    }
}
