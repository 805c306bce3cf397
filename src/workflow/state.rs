// Execution context and per-step results flowing through the engine.
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::types::ErrorInfo;

/// Identity and time budget of one workflow execution.
///
/// Created once per run, immutable, and threaded through every step
/// invocation. Concurrent executions each own their own context; nothing here
/// is shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub execution_id: String,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

impl ExecutionContext {
    /// Start a fresh execution with the given end-to-end time budget.
    pub fn new(budget: Duration) -> Self {
        let started_at = Utc::now();
        let budget = ChronoDuration::from_std(budget).unwrap_or_else(|_| ChronoDuration::hours(1));
        Self {
            execution_id: Uuid::new_v4().to_string(),
            started_at,
            deadline: started_at + budget,
        }
    }

    /// Time left before the global deadline. Zero once the deadline passed.
    pub fn remaining(&self) -> Duration {
        (self.deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// Outcome of a single step invocation.
///
/// Held only until the next stage consumes it. A failed invocation carries
/// its error here instead of propagating an `Err` into the engine loop; the
/// engine routes on `error` presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub status_code: u16,
    pub payload: Value,
    pub error: Option<ErrorInfo>,
}

impl StepResult {
    /// Completed invocation. The status code is read from a top-level
    /// `statusCode` field when the service reports one, else 200.
    pub fn completed(step: impl Into<String>, payload: Value) -> Self {
        let status_code = payload
            .get("statusCode")
            .and_then(Value::as_u64)
            .unwrap_or(200) as u16;
        Self {
            step: step.into(),
            status_code,
            payload,
            error: None,
        }
    }

    /// Invocation that failed after the invoker gave up on it.
    pub fn failed(step: impl Into<String>, error: ErrorInfo) -> Self {
        Self {
            step: step.into(),
            status_code: 0,
            payload: Value::Null,
            error: Some(error),
        }
    }
}
