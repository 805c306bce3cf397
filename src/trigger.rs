// src/trigger.rs
//! Trigger surface for workflow executions.
//! A manual trigger and the daily schedule both do the same thing: mint a
//! fresh execution context and run one independent execution. Concurrent
//! triggers never share state and are never deduplicated.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::notify::Notifier;
use crate::types::WorkflowOutcome;
use crate::workflow::{ExecutionContext, WorkflowEngine};

pub struct WorkflowRunner {
    engine: Arc<WorkflowEngine>,
    notifier: Arc<dyn Notifier>,
    source_id: String,
    global_deadline: Duration,
    schedule_interval: Duration,
}

impl WorkflowRunner {
    pub fn new(engine: Arc<WorkflowEngine>, notifier: Arc<dyn Notifier>, config: &Config) -> Self {
        Self {
            engine,
            notifier,
            source_id: config.source_id.clone(),
            global_deadline: config.global_deadline,
            schedule_interval: config.schedule_interval,
        }
    }

    /// One execution: fresh context, run to a terminal, notify.
    pub async fn run_once(&self) -> WorkflowOutcome {
        let ctx = ExecutionContext::new(self.global_deadline);
        let input = json!({
            "sourceId": self.source_id,
            "executionId": ctx.execution_id,
        });

        let outcome = self.engine.run(&ctx, input).await;
        self.notifier.notify(&outcome).await;
        outcome
    }

    /// Scheduler loop. The first tick fires immediately, then once per
    /// configured interval. Each tick spawns its own execution, so a slow run
    /// never delays or merges with the next one.
    pub async fn run_scheduled(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.schedule_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            "⏰ scheduler started, one execution every {:?}",
            self.schedule_interval
        );

        loop {
            interval.tick().await;
            let runner = Arc::clone(&self);
            tokio::spawn(async move {
                runner.run_once().await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriggerMode;
    use crate::steps::{Step, StepRegistry};
    use crate::workflow::{build_video_workflow, RetryConfig, StepError, StepInvoker};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    struct EmptySheetStep;

    #[async_trait]
    impl Step for EmptySheetStep {
        fn name(&self) -> &str {
            "ReadWorkItem"
        }

        async fn invoke(&self, input: Value) -> Result<Value, StepError> {
            let mut output = input;
            output["hasData"] = Value::Bool(false);
            Ok(output)
        }
    }

    struct RecordingNotifier {
        outcomes: Mutex<Vec<WorkflowOutcome>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, outcome: &WorkflowOutcome) {
            self.outcomes.lock().unwrap().push(outcome.clone());
        }
    }

    fn test_config() -> Config {
        Config {
            source_id: "sheet-test".to_string(),
            step_endpoints: Default::default(),
            webhook_url: None,
            trigger_mode: TriggerMode::Once,
            schedule_interval: Duration::from_secs(86_400),
            global_deadline: Duration::from_secs(5),
            step_timeout: Duration::from_secs(1),
            retry: RetryConfig::default(),
        }
    }

    #[tokio::test]
    async fn run_once_notifies_the_terminal_outcome() {
        let mut registry = StepRegistry::new();
        registry.register(Arc::new(EmptySheetStep));
        let invoker = StepInvoker::new(
            Arc::new(registry),
            RetryConfig::default(),
            Duration::from_secs(1),
        );
        let engine = Arc::new(WorkflowEngine::new(build_video_workflow().unwrap(), invoker));
        let notifier = Arc::new(RecordingNotifier { outcomes: Mutex::new(Vec::new()) });

        let runner = WorkflowRunner::new(engine, notifier.clone(), &test_config());
        let outcome = runner.run_once().await;

        assert!(matches!(outcome, WorkflowOutcome::NoWork));
        let notified = notifier.outcomes.lock().unwrap();
        assert_eq!(notified.len(), 1);
        assert!(matches!(notified[0], WorkflowOutcome::NoWork));
    }

    #[tokio::test]
    async fn triggers_mint_independent_executions() {
        let mut registry = StepRegistry::new();
        registry.register(Arc::new(EmptySheetStep));
        let invoker = StepInvoker::new(
            Arc::new(registry),
            RetryConfig::default(),
            Duration::from_secs(1),
        );
        let engine = Arc::new(WorkflowEngine::new(build_video_workflow().unwrap(), invoker));
        let notifier = Arc::new(RecordingNotifier { outcomes: Mutex::new(Vec::new()) });
        let runner = Arc::new(WorkflowRunner::new(engine, notifier.clone(), &test_config()));

        let (a, b) = tokio::join!(runner.run_once(), runner.run_once());
        assert!(matches!(a, WorkflowOutcome::NoWork));
        assert!(matches!(b, WorkflowOutcome::NoWork));
        assert_eq!(notifier.outcomes.lock().unwrap().len(), 2);
    }
}
