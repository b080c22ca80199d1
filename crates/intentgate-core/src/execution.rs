//! Execution controls for collaborator calls: per-attempt timeout and retry
//! with exponential backoff.
//!
//! Used at the story-fetch and judge-transport boundaries. Only errors the
//! caller marks retryable are retried; a timeout counts as retryable.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Timeout and retry settings for one collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionControls {
    /// Maximum wall-clock time for a single attempt (milliseconds).
    pub timeout_ms: u64,
    /// Maximum number of retries (0 = no retries, run once).
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries (milliseconds).
    pub backoff_base_ms: u64,
}

impl Default for ExecutionControls {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl ExecutionControls {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before attempt `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    /// Upper bound on the time a full retry loop can take.
    pub fn total_budget(&self) -> Duration {
        let mut total = self.timeout().saturating_mul(self.max_attempts());
        for attempt in 1..self.max_attempts() {
            total = total.saturating_add(self.backoff(attempt));
        }
        total
    }
}

/// Terminal outcome of a controlled call.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptError<E> {
    /// Every attempt timed out or the last one did.
    TimedOut { attempts: u32, limit_ms: u64 },
    /// The operation failed; `attempts` includes the failing one.
    Failed { attempts: u32, error: E },
}

impl<E: std::fmt::Display> std::fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::TimedOut { attempts, limit_ms } => write!(
                f,
                "timed out after {attempts} attempt(s) (limit {limit_ms}ms per attempt)"
            ),
            AttemptError::Failed { attempts, error } => {
                write!(f, "failed after {attempts} attempt(s): {error}")
            }
        }
    }
}

/// Run `op` under `controls`.
///
/// `is_retryable` decides whether an error earns another attempt. Timeouts
/// are always retried until attempts run out.
pub async fn execute_with_retry<T, E, F, Fut, R>(
    controls: &ExecutionControls,
    operation: &str,
    is_retryable: R,
    op: F,
) -> Result<T, AttemptError<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = controls.max_attempts();
    let mut attempt = 1;

    loop {
        let last = attempt == max_attempts;

        match tokio::time::timeout(controls.timeout(), op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => {
                if last || !is_retryable(&error) {
                    return Err(AttemptError::Failed {
                        attempts: attempt,
                        error,
                    });
                }
                warn!(operation, attempt, error = %error, "attempt failed, retrying");
            }
            Err(_elapsed) => {
                if last {
                    return Err(AttemptError::TimedOut {
                        attempts: attempt,
                        limit_ms: controls.timeout_ms,
                    });
                }
                warn!(operation, attempt, limit_ms = controls.timeout_ms, "attempt timed out, retrying");
            }
        }

        tokio::time::sleep(controls.backoff(attempt)).await;
        attempt += 1;
    }
}
