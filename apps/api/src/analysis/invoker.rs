//! Model invocation with bounded retry on rate limiting.
//!
//! Attempts are strictly sequential. The backoff is an async sleep owned by the
//! calling future, so dropping the caller (client disconnect) cancels both the
//! wait and any in-flight completion call.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::analysis::AnalysisError;
use crate::llm_client::{CompletionCapability, CompletionError};

const BASE_DELAY: Duration = Duration::from_millis(1000);

/// Attempt cap and backoff schedule: wait `base_delay * 2^attempt` after a
/// rate-limited attempt (1s, 2s, 4s, ...).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy with the standard 1s base delay. An attempt cap of 0 is treated as 1.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: BASE_DELAY,
        }
    }

    /// Delay to wait after the given zero-based attempt was rate limited.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

pub struct ModelInvoker {
    capability: Arc<dyn CompletionCapability>,
    policy: RetryPolicy,
}

impl ModelInvoker {
    pub fn new(capability: Arc<dyn CompletionCapability>, policy: RetryPolicy) -> Self {
        Self { capability, policy }
    }

    /// Returns the raw completion text, uninterpreted.
    ///
    /// Only `CompletionError::RateLimited` is retried. Any other failure is
    /// returned immediately. When the final attempt is rate limited the error
    /// is surfaced as `AnalysisError::RateLimited` without a further wait.
    pub async fn invoke(&self, prompt: &str) -> Result<String, AnalysisError> {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 0..max_attempts {
            match self.capability.complete(prompt).await {
                Ok(text) => return Ok(text),
                Err(CompletionError::RateLimited) if attempt + 1 < max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "Completion attempt {}/{} rate limited, retrying after {}ms...",
                        attempt + 1,
                        max_attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(CompletionError::RateLimited) => {
                    warn!("Completion rate limited on final attempt {max_attempts}");
                    return Err(AnalysisError::RateLimited {
                        attempts: max_attempts,
                    });
                }
                Err(CompletionError::Failure(message)) => {
                    return Err(AnalysisError::Upstream(message));
                }
            }
        }

        Err(AnalysisError::RateLimited {
            attempts: max_attempts,
        })
    }
}
