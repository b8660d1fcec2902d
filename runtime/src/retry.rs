//! Exponential-backoff retries for transient failures.
//!
//! [`retry_if`] reruns a fallible async operation while its errors satisfy a
//! caller-supplied predicate, pausing with exponential backoff between
//! attempts. Callers decide what counts as transient; permanent errors
//! surface on the first attempt without sleeping.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use storekit_runtime::retry::{RetryPolicy, retry_if};
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::new(2).with_initial_delay(Duration::from_millis(50));
//!
//! let value = retry_if(
//!     &policy,
//!     || async { Ok::<_, String>(42) },
//!     |err: &String| err.contains("timed out"),
//! )
//! .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;
use tokio::time::sleep;

/// How often and how fast to retry.
///
/// The pause after the n-th failure is
/// `initial_delay * multiplier.powi(n)`, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts allowed beyond the first one
    pub max_retries: u32,
    /// Pause after the first failure
    pub initial_delay: Duration,
    /// Upper bound on any single pause
    pub max_delay: Duration,
    /// Growth factor applied per failure
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryPolicy {
    /// Policy allowing `max_retries` extra attempts, 100ms initial pause
    /// doubling up to 30s.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    /// Set the pause after the first failure.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Cap every pause at `delay`.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the per-failure growth factor.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Pause before the attempt that follows `failures` consecutive failures.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn backoff(&self, failures: u32) -> Duration {
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(failures as i32);
        Duration::from_millis(millis as u64).min(self.max_delay)
    }
}

/// Rerun `operation` while it fails with errors that `should_retry` accepts.
///
/// Gives up after `policy.max_retries` extra attempts or as soon as an error
/// is rejected by the predicate; either way the operation's own error comes
/// back unchanged.
///
/// # Errors
///
/// Returns the first rejected error, or the last error once attempts run out.
pub async fn retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut failures = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if failures > 0 {
                    tracing::info!(failures, "Operation recovered after retrying");
                }
                return Ok(value);
            },
            Err(err) => err,
        };

        if !should_retry(&err) {
            tracing::warn!(error = %err, "Permanent failure, not retrying");
            return Err(err);
        }
        if failures >= policy.max_retries {
            tracing::error!(failures, error = %err, "Giving up after exhausting retries");
            return Err(err);
        }

        let pause = policy.backoff(failures);
        tracing::warn!(failures, pause_ms = pause.as_millis(), error = %err, "Transient failure, will retry");
        sleep(pause).await;
        failures += 1;
    }
}
