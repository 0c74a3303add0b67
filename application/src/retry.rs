//! Retry policy engine.
//!
//! Wraps an arbitrary async operation with bounded retry, optional
//! exponential backoff, and pluggable retryability classification. Used by
//! the execution engine around both tool dispatch (per variable) and the
//! streaming model exchange (as a unit).

use crate::ports::chat_gateway::GatewayError;
use crate::scoped_tools::ToolDispatchError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for retrying a failed operation.
///
/// The attempt counter is 1-based and counts every execution, including the
/// first. An error that fails the retry predicate, or occurs on the final
/// attempt, is returned unmodified.
#[derive(Clone)]
pub struct RetryPolicy<E> {
    /// Maximum number of attempts (including the first); at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Per-attempt exponential multiplier; `None` keeps the delay constant.
    pub backoff_multiplier: Option<f64>,
    retry_on: Arc<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E> RetryPolicy<E> {
    /// Create a policy that retries every error shape.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_multiplier: None,
            retry_on: Arc::new(|_| true),
        }
    }

    /// Apply exponential backoff with the given multiplier.
    pub fn with_backoff(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = Some(multiplier);
        self
    }

    /// Restrict retries to errors matching `predicate`.
    pub fn with_retry_on(
        mut self,
        predicate: impl Fn(&E) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.retry_on = Arc::new(predicate);
        self
    }

    /// Delay before the retry following attempt number `attempt` (1-based):
    /// `initial_delay * multiplier^(attempt - 1)`, or `initial_delay` when
    /// no multiplier is configured.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff_multiplier {
            Some(multiplier) => self
                .initial_delay
                .mul_f64(multiplier.powi(attempt.saturating_sub(1) as i32)),
            None => self.initial_delay,
        }
    }

    /// Run `operation`, retrying per this policy.
    ///
    /// `on_retry(attempt, max_attempts, error, next_delay)` is invoked for
    /// observability before every sleep; it never fires for the final
    /// failure. The sleep blocks only the calling task.
    pub async fn run<T, F, Fut>(
        &self,
        on_retry: impl Fn(u32, u32, &E, Duration),
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if !(self.retry_on)(&error) || attempt >= self.max_attempts {
                        return Err(error);
                    }
                    let delay = self.delay_for(attempt);
                    debug!(attempt, max = self.max_attempts, ?delay, "Retrying after failure");
                    on_retry(attempt, self.max_attempts, &error, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl RetryPolicy<GatewayError> {
    /// Preset for the streaming model exchange: retries blank-output and
    /// "received empty response" failures with exponential backoff.
    pub fn streaming() -> Self {
        Self::new(3, Duration::from_millis(500))
            .with_backoff(2.0)
            .with_retry_on(GatewayError::is_transient)
    }
}

impl RetryPolicy<ToolDispatchError> {
    /// Preset for tool dispatch: retries only faults internal to the tool
    /// layer. Unknown/disallowed tools and ordinary tool failures
    /// propagate on first occurrence.
    pub fn tool_transient() -> Self {
        Self::new(2, Duration::from_millis(250)).with_retry_on(ToolDispatchError::is_internal)
    }
}
