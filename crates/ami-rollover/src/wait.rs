//! Bounded polling with a fixed interval.
//!
//! Replaces the provider's blocking waiters with an explicit loop: run a
//! check, sleep a fixed interval, give up after a maximum number of checks.
//! Each call site supplies its own [`WaitConfig`]; the outcome is a typed
//! [`WaitError`] so callers can tell a timeout from a failed check.

use backon::{BackoffBuilder, ConstantBuilder};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Polling parameters for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Delay between consecutive checks
    pub interval: Duration,
    /// Maximum number of checks, including the first one
    pub max_attempts: u32,
}

impl WaitConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on the time spent sleeping between checks
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Why a wait ended without the resource becoming ready
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("Timed out waiting for {resource} after {attempts} attempts")]
    TimedOut { resource: String, attempts: u32 },

    #[error(transparent)]
    Check(#[from] anyhow::Error),
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::TimedOut { .. })
    }

    /// Convert to `anyhow`, handing back a failed check's error unwrapped so
    /// callers can still downcast it.
    pub fn into_anyhow(self) -> anyhow::Error {
        match self {
            WaitError::Check(e) => e,
            timeout => anyhow::Error::new(timeout),
        }
    }
}

/// Poll `check` until it reports ready.
///
/// `check` returns `Ok(true)` when the resource is ready, `Ok(false)` to poll
/// again after `config.interval`, or an error to stop immediately. At most
/// `config.max_attempts` checks run (at least one). Returns the number of
/// checks performed.
pub async fn wait_for_resource<F, Fut>(
    config: &WaitConfig,
    check: F,
    resource_name: &str,
) -> Result<u32, WaitError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    let mut delays = ConstantBuilder::default()
        .with_delay(config.interval)
        .with_max_times(config.max_attempts.saturating_sub(1) as usize)
        .build();
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        match check().await {
            Ok(true) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(attempts);
            }
            Ok(false) => match delays.next() {
                Some(delay) => {
                    debug!(
                        resource = %resource_name,
                        attempt = attempts,
                        delay_ms = delay.as_millis(),
                        "Resource not ready, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(WaitError::TimedOut {
                        resource: resource_name.to_string(),
                        attempts,
                    });
                }
            },
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Resource check failed");
                return Err(WaitError::Check(e));
            }
        }
    }
}
