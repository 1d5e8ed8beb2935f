//! Bounded retry loop behind every wait primitive
//!
//! A check runs immediately, then once per interval. The last sleep is
//! clamped to the deadline so the check gets one final attempt exactly when
//! the budget runs out. Time comes from `tokio::time`, so a paused runtime
//! drives the loop deterministically.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::common::{Error, Result};

/// Delay between two checks unless configured otherwise
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Bound for waits that don't pass their own timeout
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future returned by poll checks
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Condition holds; the poll returns this value
    Ready(T),
    /// Not yet; carries a description of what was observed instead
    Pending(String),
}

/// Timing and labelling for one poll
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
    /// Human-readable condition, used in the timeout error
    pub what: String,
}

impl PollOptions {
    pub fn new(interval: Duration, timeout: Duration, what: impl Into<String>) -> Self {
        Self {
            interval,
            timeout,
            what: what.into(),
        }
    }
}

/// Run `check` against `ctx` until it is ready, fails for good, or time runs out
///
/// Retryable errors (see [`Error::is_retryable`]) count as "not yet"; any
/// other error is returned at once without waiting for the deadline.
pub async fn poll<C, T, F>(ctx: &mut C, opts: &PollOptions, mut check: F) -> Result<T>
where
    C: ?Sized,
    F: for<'a> FnMut(&'a mut C) -> BoxFut<'a, Result<Probe<T>>>,
{
    let started = Instant::now();
    let deadline = started + opts.timeout;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        let last_seen = match check(ctx).await {
            Ok(Probe::Ready(value)) => {
                tracing::debug!(
                    what = %opts.what,
                    attempts,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "Condition met"
                );
                return Ok(value);
            }
            Ok(Probe::Pending(seen)) => seen,
            Err(e) if e.is_retryable() => e.to_string(),
            Err(e) => {
                tracing::debug!(what = %opts.what, attempts, error = %e, "Poll aborted");
                return Err(e);
            }
        };

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(what = %opts.what, attempts, last_seen = %last_seen, "Poll timed out");
            return Err(Error::timeout(&opts.what, now - started, &last_seen));
        }

        tracing::trace!(what = %opts.what, attempts, last_seen = %last_seen, "Not yet");
        sleep(opts.interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(250);

    /// Check state: becomes ready once the clock passes `ready_at`
    struct Flip {
        ready_at: Instant,
        calls: u32,
    }

    fn flip_check(state: &mut Flip) -> BoxFut<'_, Result<Probe<u32>>> {
        Box::pin(async move {
            state.calls += 1;
            if Instant::now() >= state.ready_at {
                Ok(Probe::Ready(state.calls))
            } else {
                Ok(Probe::Pending("still installing".to_string()))
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_immediately() {
        let start = Instant::now();
        let mut state = Flip {
            ready_at: start,
            calls: 0,
        };
        let opts = PollOptions::new(INTERVAL, Duration::from_secs(1), "ready");

        let calls = poll(&mut state, &opts, flip_check).await.unwrap();
        assert_eq!(calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_within_one_interval_of_condition() {
        let start = Instant::now();
        let becomes_true = Duration::from_millis(1100);
        let mut state = Flip {
            ready_at: start + becomes_true,
            calls: 0,
        };
        let opts = PollOptions::new(INTERVAL, Duration::from_secs(10), "flip");

        poll(&mut state, &opts, flip_check).await.unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= becomes_true);
        assert!(elapsed <= becomes_true + INTERVAL, "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bounds() {
        let start = Instant::now();
        let timeout = Duration::from_millis(1100);
        let mut state = Flip {
            ready_at: start + Duration::from_secs(3600),
            calls: 0,
        };
        let opts = PollOptions::new(INTERVAL, timeout, "never");

        let err = poll(&mut state, &opts, flip_check).await.unwrap_err();

        let elapsed = start.elapsed();
        assert!(elapsed >= timeout);
        assert!(elapsed <= timeout + INTERVAL, "took {elapsed:?}");
        match err {
            Error::Timeout { what, last_seen, .. } => {
                assert_eq!(what, "never");
                assert_eq!(last_seen, "still installing");
            }
            other => panic!("Expected Timeout, got {other:?}"),
        }
        // checks at 0, 250, 500, 750, 1000 and the clamped one at 1100
        assert_eq!(state.calls, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_immediately() {
        let start = Instant::now();
        let mut calls = 0u32;
        let opts = PollOptions::new(INTERVAL, Duration::from_secs(30), "disconnect");

        let err = poll(&mut calls, &opts, |calls: &mut u32| {
            Box::pin(async move {
                *calls += 1;
                if *calls < 3 {
                    Ok(Probe::<()>::Pending("waiting".to_string()))
                } else {
                    Err(Error::SessionFailure("chromedriver went away".to_string()))
                }
            })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::SessionFailure(_)));
        assert_eq!(calls, 3);
        assert_eq!(start.elapsed(), INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_error_keeps_polling() {
        let mut calls = 0u32;
        let opts = PollOptions::new(INTERVAL, Duration::from_secs(5), "stale then ready");

        let value = poll(&mut calls, &opts, |calls: &mut u32| {
            Box::pin(async move {
                *calls += 1;
                if *calls < 4 {
                    Err(Error::StaleElement("re-rendered".to_string()))
                } else {
                    Ok(Probe::Ready("Launch"))
                }
            })
        })
        .await
        .unwrap();

        assert_eq!(value, "Launch");
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_error_reported_on_timeout() {
        let opts = PollOptions::new(INTERVAL, Duration::from_millis(500), "always stale");

        let err = poll(&mut (), &opts, |_: &mut ()| {
            Box::pin(async { Err::<Probe<()>, _>(Error::StaleElement("detached".to_string())) })
        })
        .await
        .unwrap_err();

        match err {
            Error::Timeout { last_seen, .. } => assert!(last_seen.contains("detached")),
            other => panic!("Expected Timeout, got {other:?}"),
        }
    }
}
