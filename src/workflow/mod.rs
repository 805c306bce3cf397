// Workflow orchestration engine for the video generation pipeline.
pub mod error;
pub mod executor;
pub mod graph;
pub mod invoker;
pub mod router;
pub mod state;
pub mod transform;
pub mod video_workflow;

pub use error::{GraphError, StepError};
pub use executor::WorkflowEngine;
pub use graph::{GraphBuilder, NodeKind, TerminalKind, WorkflowGraph};
pub use invoker::{RetryConfig, StepInvoker};
pub use router::{BranchRules, Condition};
pub use state::{ExecutionContext, StepResult};
pub use transform::FieldMapping;
pub use video_workflow::build_video_workflow;
