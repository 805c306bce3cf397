// Error taxonomy for step invocation and graph construction.
use thiserror::Error;

use crate::types::ErrorKind;

/// Failure reported by a step implementation.
///
/// Transient failures (service unavailable, throttling, timeouts) are
/// retried by the invoker within its configured bounds. Validation failures
/// (malformed input, permanent rejection) escalate immediately.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("validation failure: {0}")]
    Validation(String),
}

impl StepError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StepError::Transient(_) => ErrorKind::Transient,
            StepError::Validation(_) => ErrorKind::Validation,
        }
    }
}

/// Construction-time defect in a workflow graph definition.
///
/// These surface from `GraphBuilder::build`, never at runtime: a graph that
/// compiles cannot route off its nodes or fail to terminate.
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("no entry point set")]
    NoEntryPoint,
    #[error("node '{0}' is defined twice")]
    DuplicateNode(String),
    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),
    #[error("node '{0}' has no outgoing edge")]
    MissingContinuation(String),
    #[error("terminal node '{0}' must not have an outgoing edge")]
    TerminalWithEdge(String),
    #[error("branch node '{0}' routes through its rules, not an edge")]
    BranchWithEdge(String),
    #[error("parallel node '{0}' declares no branches")]
    EmptyParallel(String),
    #[error("parallel branch names on node '{0}' must be unique")]
    DuplicateBranch(String),
    #[error("workflow graph contains a cycle through '{0}'")]
    CycleDetected(String),
}
