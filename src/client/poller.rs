//! Bounded polling loop.
//!
//! Both pipeline stages (vision status, interpretation status) poll with
//! the same pattern: fixed interval, bounded attempt count, transient
//! transport errors retried in place. There is no out-of-band cancel
//! signal; attempt-budget exhaustion is the only cancellation mechanism.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// How often (in attempts) a progress line is emitted while waiting.
const PROGRESS_EVERY: u32 = 5;

/// What one status check observed.
#[derive(Debug, Clone)]
pub enum Check<T> {
    /// Job still running; keep polling.
    Pending,
    /// Job reached a terminal state.
    Terminal(T),
}

/// How the polling loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The check reported a terminal state.
    Terminal(T),
    /// The attempt budget ran out before any terminal state. Distinct from
    /// a reported failure: remediation differs (try again later vs. fix
    /// the input).
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
    /// User-facing progress message, logged periodically while pending.
    pub progress: &'static str,
}

impl PollConfig {
    pub fn new(max_attempts: u32, interval: Duration, progress: &'static str) -> Self {
        Self {
            max_attempts,
            interval,
            progress,
        }
    }
}

/// Poll `check` until it reports a terminal state or the budget runs out.
///
/// A transport error during a single check is not a job failure (the
/// provider may be unreachable this one time), so the loop waits and
/// retries. Only an explicit terminal result or attempt exhaustion ends
/// the loop, which therefore always returns within
/// `max_attempts * interval` plus the duration of the checks themselves.
pub async fn poll_until_terminal<T, E, F, Fut>(config: PollConfig, mut check: F) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Check<T>, E>>,
    E: Display,
{
    for attempt in 0..config.max_attempts {
        match check().await {
            Ok(Check::Terminal(value)) => return PollOutcome::Terminal(value),
            Ok(Check::Pending) => {
                if attempt > 0 && attempt % PROGRESS_EVERY == 0 {
                    info!(attempt, "{}", config.progress);
                }
            }
            Err(e) => {
                warn!(attempt, error = %e, "status check failed, will retry");
            }
        }

        if attempt + 1 < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    PollOutcome::TimedOut
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_config(max_attempts: u32) -> PollConfig {
        PollConfig::new(max_attempts, Duration::from_millis(1), "waiting")
    }

    #[tokio::test]
    async fn test_never_terminal_times_out() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();

        let outcome: PollOutcome<()> = poll_until_terminal(fast_config(5), move || {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Check::Pending)
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_terminal_on_first_check_polls_exactly_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();

        let outcome = poll_until_terminal(fast_config(60), move || {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Check::Terminal("validation_failed"))
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Terminal("validation_failed"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_do_not_abort() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();

        let outcome = poll_until_terminal(fast_config(10), move || {
            let seen = seen.clone();
            async move {
                match seen.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err("connection refused".to_string()),
                    2 => Ok(Check::Pending),
                    _ => Ok(Check::Terminal("completed")),
                }
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Terminal("completed"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_only_errors_still_exhausts_budget() {
        let outcome: PollOutcome<()> = poll_until_terminal(fast_config(3), || async {
            Err::<Check<()>, _>("unreachable".to_string())
        })
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut);
    }
}
