//! Bounded waits.
//!
//! Every step of a scenario is "observe something, and keep observing until it
//! holds or the step's timeout elapses". [`wait_for`] is that primitive; the
//! action helpers and the checkout scenario never sleep on their own.

use crate::result::{FlowError, FlowResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default timeout for wait operations (8 seconds, the runner's command timeout)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 8_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value produced by the probe
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

/// Poll `probe` until it yields `Some`, or fail with [`FlowError::Timeout`].
///
/// The probe runs at least once, even with a zero timeout. A probe error is
/// returned immediately; only "not yet" (`Ok(None)`) is retried.
pub async fn wait_for<T, F, Fut>(
    waited_for: impl Into<String>,
    options: &WaitOptions,
    mut probe: F,
) -> FlowResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FlowResult<Option<T>>>,
{
    let waited_for = waited_for.into();
    let start = Instant::now();
    let timeout = options.timeout();
    let poll_interval = options.poll_interval();

    loop {
        if let Some(value) = probe().await? {
            let elapsed = start.elapsed();
            tracing::debug!(waited_for = %waited_for, elapsed_ms = elapsed.as_millis() as u64, "wait satisfied");
            return Ok(WaitResult {
                value,
                elapsed,
                waited_for,
            });
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            tracing::debug!(waited_for = %waited_for, timeout_ms = options.timeout_ms, "wait timed out");
            return Err(FlowError::Timeout {
                waited_for,
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
    }
}

/// Poll a boolean condition; convenience over [`wait_for`].
pub async fn wait_until<F, Fut>(
    waited_for: impl Into<String>,
    options: &WaitOptions,
    mut condition: F,
) -> FlowResult<Duration>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FlowResult<bool>>,
{
    let result = wait_for(waited_for, options, || {
        let check = condition();
        async move { Ok(check.await?.then_some(())) }
    })
    .await?;
    Ok(result.elapsed)
}

/// Re-label a timeout as "not found" for waits on a specific entry or file.
#[must_use]
pub fn not_found(err: FlowError) -> FlowError {
    match err {
        FlowError::Timeout { waited_for, ms } => FlowError::NotFound {
            what: waited_for,
            ms,
        },
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_wait_options_builders() {
            let opts = WaitOptions::new().with_timeout(20_000).with_poll_interval(10);
            assert_eq!(opts.timeout(), Duration::from_secs(20));
            assert_eq!(opts.poll_interval(), Duration::from_millis(10));
        }
    }

    mod wait_for_tests {
        use super::*;

        #[tokio::test]
        async fn test_immediate_success() {
            let opts = WaitOptions::new().with_timeout(100);
            let result = wait_for("ready", &opts, || async { Ok(Some(42)) })
                .await
                .unwrap();
            assert_eq!(result.value, 42);
            assert_eq!(result.waited_for, "ready");
        }

        #[tokio::test(start_paused = true)]
        async fn test_becomes_true_after_polls() {
            let calls = AtomicUsize::new(0);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(50);
            let result = wait_for("third poll", &opts, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok((n >= 2).then_some(n)) }
            })
            .await
            .unwrap();
            assert_eq!(result.value, 2);
            assert!(result.elapsed >= Duration::from_millis(100));
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_reports_bound() {
            let opts = WaitOptions::new().with_timeout(300);
            let err = wait_for::<(), _, _>("never", &opts, || async { Ok(None) })
                .await
                .unwrap_err();
            match err {
                FlowError::Timeout { waited_for, ms } => {
                    assert_eq!(waited_for, "never");
                    assert_eq!(ms, 300);
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_zero_timeout_still_probes_once() {
            let calls = AtomicUsize::new(0);
            let opts = WaitOptions::new().with_timeout(0);
            let _ = wait_for::<(), _, _>("once", &opts, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            })
            .await;
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_probe_error_is_not_retried() {
            let calls = AtomicUsize::new(0);
            let opts = WaitOptions::new().with_timeout(1_000);
            let err = wait_for::<(), _, _>("broken", &opts, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FlowError::page("detached")) }
            })
            .await
            .unwrap_err();
            assert!(matches!(err, FlowError::Page { .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_until_condition() {
            let calls = AtomicUsize::new(0);
            let opts = WaitOptions::new().with_timeout(500);
            let elapsed = wait_until("flag", &opts, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n == 1) }
            })
            .await
            .unwrap();
            assert!(elapsed >= Duration::from_millis(50));
        }
    }

    #[test]
    fn test_not_found_relabels_timeout_only() {
        let err = not_found(FlowError::Timeout {
            waited_for: "product \"Pink Top\"".to_string(),
            ms: 10,
        });
        assert!(matches!(err, FlowError::NotFound { ms: 10, .. }));

        let err = not_found(FlowError::page("boom"));
        assert!(matches!(err, FlowError::Page { .. }));
    }
}
