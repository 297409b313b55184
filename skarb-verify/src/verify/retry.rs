/// Bounded polling for writes that land after the UI reports success
///
/// By default a check runs exactly once: the application is assumed to commit
/// before it shows its success message. When that does not hold, a
/// [`RetryPolicy`] with more attempts re-runs the check with doubling backoff.
///
/// # Example
///
/// ```
/// use skarb_verify::verify::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(4, Duration::from_millis(100));
/// assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
/// assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
/// assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
/// ```

use crate::error::{VerifyError, VerifyResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How often and how patiently to re-run a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (at least 1)
    pub attempts: u32,

    /// Delay before the second attempt
    pub initial_backoff: Duration,

    /// Upper bound for any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub const fn none() -> Self {
        Self {
            attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// `attempts` tries starting at `initial_backoff`, capped at 5 seconds per wait
    pub fn new(attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            initial_backoff,
            max_backoff: Duration::from_secs(5).max(initial_backoff),
        }
    }

    /// Delay after the given (0-based) failed attempt
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Re-runs `condition` until it yields true or the attempts run out
///
/// Infrastructure errors from the condition are returned immediately; only a
/// `false` answer is retried. After the last attempt the result is
/// `VerifyError::Timeout` naming `what`.
pub async fn wait_until<F, Fut>(policy: RetryPolicy, what: &str, mut condition: F) -> VerifyResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = VerifyResult<bool>>,
{
    let attempts = policy.attempts.max(1);

    for attempt in 0..attempts {
        if condition().await? {
            debug!(what, attempt = attempt + 1, "Condition observed");
            return Ok(());
        }

        if attempt + 1 < attempts {
            let delay = policy.backoff_for(attempt);
            warn!(what, attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "Condition not met yet, retrying");
            tokio::time::sleep(delay).await;
        }
    }

    Err(VerifyError::Timeout {
        what: what.to_string(),
        attempts,
    })
}
