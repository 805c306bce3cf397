// Executor - walks the workflow graph from entry point to a terminal.
use futures::future::join_all;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::graph::{NodeKind, TerminalKind, WorkflowGraph};
use super::invoker::StepInvoker;
use super::state::{ExecutionContext, StepResult};
use crate::types::{ErrorInfo, ErrorKind, MediaAsset, WorkflowOutcome};

/// Drives one workflow graph.
///
/// The engine owns no per-run state: every `run` call carries its own
/// context, cursor, and payload, so any number of executions can share one
/// engine concurrently. The engine routes and enforces the global deadline;
/// retrying individual steps is the invoker's job, and concurrency exists
/// only inside parallel nodes.
pub struct WorkflowEngine {
    graph: WorkflowGraph,
    invoker: StepInvoker,
}

impl WorkflowEngine {
    pub fn new(graph: WorkflowGraph, invoker: StepInvoker) -> Self {
        Self { graph, invoker }
    }

    /// Run one execution to a terminal outcome.
    ///
    /// The whole run is capped by the context's deadline; a step that only
    /// finishes after the deadline still ends the run in a deadline failure,
    /// whatever the step itself returned.
    pub async fn run(&self, ctx: &ExecutionContext, input: Value) -> WorkflowOutcome {
        info!("🚀 [{}] starting workflow execution", ctx.execution_id);

        let budget = ctx.remaining().max(std::time::Duration::from_millis(1));
        let outcome = match timeout(budget, self.run_inner(ctx, input)).await {
            Ok(outcome) => outcome,
            Err(_) => deadline_failure(ctx, "Workflow"),
        };

        match &outcome {
            WorkflowOutcome::Success { uploaded_ref, .. } => {
                info!("✅ [{}] workflow completed, uploaded as {}", ctx.execution_id, uploaded_ref);
            }
            WorkflowOutcome::NoWork => {
                info!("📭 [{}] no pending work found", ctx.execution_id);
            }
            WorkflowOutcome::Failure { failed_step, error } => {
                error!(
                    "❌ [{}] workflow failed at '{}': {}",
                    ctx.execution_id, failed_step, error.message
                );
            }
        }

        outcome
    }

    async fn run_inner(&self, ctx: &ExecutionContext, input: Value) -> WorkflowOutcome {
        let mut current = self.graph.entry_point().to_string();
        let mut data = input;
        // Name of the most recent task or parallel node, for branch
        // normalization and failure attribution.
        let mut last_step = current.clone();
        let mut last_task_input = Value::Null;
        let mut pending_error: Option<ErrorInfo> = None;

        // The graph is acyclic, so a path can visit each node at most once.
        for _ in 0..=self.graph.node_count() {
            if ctx.expired() {
                return deadline_failure(ctx, &current);
            }

            let node = match self.graph.node(&current) {
                Some(node) => node,
                None => return config_failure(&current, "routed to an unknown node"),
            };

            match &node.kind {
                NodeKind::Task { step } => {
                    info!("📍 [{}] invoking step '{}'", ctx.execution_id, step);
                    last_task_input = data.clone();
                    let result = self.invoker.invoke(step, data, ctx).await;
                    if ctx.expired() {
                        return deadline_failure(ctx, step);
                    }
                    if let Some(error) = result.error {
                        return WorkflowOutcome::Failure { failed_step: step.clone(), error };
                    }
                    data = result.payload;
                    last_step = step.clone();
                    match self.graph.next_of(&node.id) {
                        Some(next) => current = next.to_string(),
                        None => return config_failure(&node.id, "task node has no continuation"),
                    }
                }

                NodeKind::Transform { mapping } => {
                    data = mapping.apply(&data);
                    match self.graph.next_of(&node.id) {
                        Some(next) => current = next.to_string(),
                        None => return config_failure(&node.id, "transform node has no continuation"),
                    }
                }

                NodeKind::Branch { rules } => {
                    let view = StepResult::completed(last_step.clone(), data.clone());
                    let target = rules.evaluate(&view).to_string();
                    info!(
                        "🔀 [{}] branch '{}' routed '{}' (status {}) to '{}'",
                        ctx.execution_id, node.id, last_step, view.status_code, target
                    );
                    // Routing into the failure terminal replaces whatever the
                    // step reported with one normalized error shape.
                    if self.is_failure_terminal(&target) {
                        pending_error = Some(ErrorInfo::new(
                            last_step.clone(),
                            ErrorKind::Validation,
                            format!("step '{}' reported status {}", last_step, view.status_code),
                        ));
                    }
                    current = target;
                }

                NodeKind::Parallel { branches } => {
                    last_task_input = data.clone();
                    match self.run_parallel(&data, branches, ctx).await {
                        Ok(payloads) => {
                            if ctx.expired() {
                                return deadline_failure(ctx, &node.id);
                            }
                            data = Value::Array(payloads);
                            last_step = node.id.clone();
                            match self.graph.next_of(&node.id) {
                                Some(next) => current = next.to_string(),
                                None => {
                                    return config_failure(&node.id, "parallel node has no continuation")
                                }
                            }
                        }
                        Err((failed_branch, error)) => {
                            if ctx.expired() {
                                return deadline_failure(ctx, &failed_branch);
                            }
                            return WorkflowOutcome::Failure { failed_step: failed_branch, error };
                        }
                    }
                }

                NodeKind::Terminal { kind } => {
                    return self.finish(*kind, &data, &last_task_input, &last_step, pending_error);
                }
            }
        }

        // Unreachable once a graph has compiled; kept as a routing backstop.
        config_failure(&current, "graph traversal did not reach a terminal")
    }

    /// Fan `input` out to every branch concurrently and wait for all of them.
    ///
    /// The result vector follows branch-declaration order, never completion
    /// order. If any branch fails the whole join fails and the sibling
    /// results are discarded; in-flight siblings are not force-cancelled
    /// (best effort only), their outputs are simply ignored.
    async fn run_parallel(
        &self,
        input: &Value,
        branches: &[String],
        ctx: &ExecutionContext,
    ) -> Result<Vec<Value>, (String, ErrorInfo)> {
        info!("⚡ [{}] fanning out to {:?}", ctx.execution_id, branches);

        let invocations: Vec<_> = branches
            .iter()
            .map(|branch| self.invoker.invoke(branch, input.clone(), ctx))
            .collect();
        let results = join_all(invocations).await;

        for (branch, result) in branches.iter().zip(&results) {
            if let Some(cause) = &result.error {
                warn!("⚠️ parallel branch '{}' failed, discarding sibling results", branch);
                let error = ErrorInfo::new(
                    branch.clone(),
                    ErrorKind::Join,
                    format!("parallel branch '{}' failed: {}", branch, cause.message),
                );
                return Err((branch.clone(), error));
            }
        }

        Ok(results.into_iter().map(|r| r.payload).collect())
    }

    fn is_failure_terminal(&self, id: &str) -> bool {
        matches!(
            self.graph.node(id).map(|n| &n.kind),
            Some(NodeKind::Terminal { kind: TerminalKind::Failure })
        )
    }

    fn finish(
        &self,
        kind: TerminalKind,
        data: &Value,
        last_task_input: &Value,
        last_step: &str,
        pending_error: Option<ErrorInfo>,
    ) -> WorkflowOutcome {
        match kind {
            TerminalKind::NoWork => WorkflowOutcome::NoWork,
            TerminalKind::Failure => {
                let error = pending_error.unwrap_or_else(|| {
                    ErrorInfo::new(
                        last_step,
                        ErrorKind::Validation,
                        "workflow routed to the failure terminal",
                    )
                });
                WorkflowOutcome::Failure { failed_step: error.step.clone(), error }
            }
            TerminalKind::Success => {
                let uploaded_ref = data
                    .get("uploadedRef")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let public_url = data
                    .get("publicUrl")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                // The upload step's input still carries the composed video
                // reference; its output carries the upload receipt.
                let video = last_task_input
                    .get("video")
                    .cloned()
                    .and_then(|v| serde_json::from_value::<MediaAsset>(v).ok());

                match (uploaded_ref, video) {
                    (Some(uploaded_ref), Some(video)) => {
                        WorkflowOutcome::Success { video, uploaded_ref, public_url }
                    }
                    _ => WorkflowOutcome::Failure {
                        failed_step: last_step.to_string(),
                        error: ErrorInfo::new(
                            last_step,
                            ErrorKind::Validation,
                            "success terminal reached without an upload receipt and video asset",
                        ),
                    },
                }
            }
        }
    }
}

fn deadline_failure(ctx: &ExecutionContext, at: &str) -> WorkflowOutcome {
    WorkflowOutcome::Failure {
        failed_step: at.to_string(),
        error: ErrorInfo::new(
            at,
            ErrorKind::DeadlineExceeded,
            format!(
                "global deadline {} exceeded while at '{}'",
                ctx.deadline.to_rfc3339(),
                at
            ),
        ),
    }
}

fn config_failure(at: &str, message: &str) -> WorkflowOutcome {
    WorkflowOutcome::Failure {
        failed_step: at.to_string(),
        error: ErrorInfo::new(at, ErrorKind::BranchMismatch, message),
    }
}
