// src/steps/mod.rs
//! Uniform contract for the external collaborators the workflow drives.
//! Each step receives a JSON payload and returns a JSON payload or a
//! classified error; everything else about a step is its own business.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::workflow::StepError;

pub mod http_step;

pub use http_step::HttpStep;

/// The seven collaborators of the video pipeline, in backbone order.
pub const STEP_NAMES: [&str; 7] = [
    "ReadWorkItem",
    "GenerateScript",
    "PersistScript",
    "GenerateImages",
    "SynthesizeAudio",
    "ComposeVideo",
    "UploadVideo",
];

/// One externally implemented unit of work.
///
/// Contract:
/// - the input is already shaped for this step (upstream transforms own that);
/// - a completed call returns the service's JSON output, which includes a
///   `statusCode` field when the service reports request-level status, and
///   echoes identity fields (`executionId`, `sourceId`, row data) it received
///   but did not consume, so downstream transforms can reference them;
/// - invoking twice with the same input must be safe; idempotency is the
///   step's responsibility, keyed by `executionId` and/or `row`;
/// - failures are classified: `Transient` will be retried, `Validation`
///   will not.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;
    async fn invoke(&self, input: Value) -> Result<Value, StepError>;
}

/// Constructor-injected set of step implementations.
///
/// The engine looks collaborators up here by name; tests register in-memory
/// fakes the same way production registers HTTP adapters.
#[derive(Default)]
pub struct StepRegistry {
    steps: HashMap<String, Arc<dyn Step>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, step: Arc<dyn Step>) {
        self.steps.insert(step.name().to_string(), step);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Step>> {
        self.steps.get(name).cloned()
    }
}
