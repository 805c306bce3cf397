// Step invocation with per-attempt timeouts and bounded exponential retry.
use backoff::{future::retry, ExponentialBackoff};
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use super::error::StepError;
use super::state::{ExecutionContext, StepResult};
use crate::steps::StepRegistry;
use crate::types::{ErrorInfo, ErrorKind};

/// Retry bounds for transient step failures. Configuration, not constants.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Invokes one step at a time on behalf of the engine.
///
/// Stateless with respect to the graph. Failures never cross this boundary
/// as `Err`: after retries are exhausted the error travels inside the
/// returned `StepResult`, and the engine routes on its presence.
pub struct StepInvoker {
    registry: Arc<StepRegistry>,
    retry: RetryConfig,
    step_timeout: Duration,
}

impl StepInvoker {
    pub fn new(registry: Arc<StepRegistry>, retry: RetryConfig, step_timeout: Duration) -> Self {
        Self {
            registry,
            retry,
            step_timeout,
        }
    }

    /// Invoke `step_name` with `input`.
    ///
    /// Each attempt runs under the per-step timeout, clamped to the time left
    /// on the execution's global deadline so retries never outlive the run.
    /// Timeouts count as transient. Validation failures escalate on the
    /// first attempt.
    pub async fn invoke(&self, step_name: &str, input: Value, ctx: &ExecutionContext) -> StepResult {
        let step = match self.registry.get(step_name) {
            Some(step) => step,
            None => {
                return StepResult::failed(
                    step_name,
                    ErrorInfo::new(
                        step_name,
                        ErrorKind::Validation,
                        format!("no step registered under '{}'", step_name),
                    ),
                );
            }
        };

        let remaining = ctx.remaining();
        if remaining.is_zero() {
            return StepResult::failed(
                step_name,
                ErrorInfo::new(
                    step_name,
                    ErrorKind::DeadlineExceeded,
                    "global deadline exhausted before invocation",
                ),
            );
        }

        let backoff_config = ExponentialBackoff {
            initial_interval: self.retry.initial_interval,
            max_interval: self.retry.max_interval,
            multiplier: self.retry.multiplier,
            max_elapsed_time: Some(remaining),
            ..Default::default()
        };

        let attempts = AtomicU32::new(0);
        let operation = || {
            let step = Arc::clone(&step);
            let input = input.clone();
            let attempts = &attempts;
            async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                let attempt_timeout = self
                    .step_timeout
                    .min(ctx.remaining().max(Duration::from_millis(1)));

                let outcome = match timeout(attempt_timeout, step.invoke(input)).await {
                    Ok(result) => result,
                    Err(_) => Err(StepError::Transient(format!(
                        "timed out after {:?}",
                        attempt_timeout
                    ))),
                };

                match outcome {
                    Ok(payload) => Ok(payload),
                    Err(e @ StepError::Validation(_)) => Err(backoff::Error::permanent(e)),
                    Err(StepError::Transient(message)) => {
                        if attempt >= self.retry.max_attempts {
                            Err(backoff::Error::permanent(StepError::Transient(format!(
                                "{} (gave up after {} attempts)",
                                message, attempt
                            ))))
                        } else {
                            tracing::warn!(
                                "step '{}' attempt {}/{} failed (retrying): {}",
                                step_name,
                                attempt,
                                self.retry.max_attempts,
                                message
                            );
                            Err(backoff::Error::transient(StepError::Transient(message)))
                        }
                    }
                }
            }
        };

        match retry(backoff_config, operation).await {
            Ok(payload) => StepResult::completed(step_name, payload),
            Err(e) => {
                tracing::error!("step '{}' failed: {}", step_name, e);
                StepResult::failed(step_name, ErrorInfo::new(step_name, e.kind(), e.to_string()))
            }
        }
    }
}
