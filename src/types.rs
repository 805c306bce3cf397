// src/types.rs
//! Data model shared across the video generation pipeline.
//! Everything here crosses a step boundary as JSON, so wire names follow the
//! camelCase convention of the external services.

use serde::{Deserialize, Serialize};

/// Processing status of a spreadsheet row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Empty,
    Todo,
    Processing,
    ScriptGenerated,
    Completed,
}

/// One row of pending work from the tracking sheet.
///
/// Identified by its 1-based row position. The orchestrator never deletes
/// rows; later steps advance `status` in the external sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub row: u32,
    pub prompt: String,
    pub theme: String,
    pub duration_seconds: u32,
    pub status: RowStatus,
}

/// Script produced by the language model for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptArtifact {
    pub title: String,
    pub description: String,
    pub narration_text: String,
    pub image_prompts: Vec<String>,
    pub tags: Vec<String>,
    pub estimated_duration_seconds: u32,
}

impl ScriptArtifact {
    /// A usable script narrates something and illustrates something.
    pub fn validate(&self) -> Result<(), String> {
        if self.narration_text.trim().is_empty() {
            return Err("script has empty narration text".to_string());
        }
        if self.image_prompts.is_empty() {
            return Err("script has no image prompts".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

/// Reference to a generated asset in the blob store.
///
/// Steps exchange asset references only. The bytes themselves never travel
/// through workflow state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub kind: MediaKind,
    pub location_ref: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

/// Classification of a workflow error, used for routing and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Transient,
    Validation,
    BranchMismatch,
    Join,
    DeadlineExceeded,
}

/// Normalized error payload carried to the failure terminal.
///
/// Every failure, whatever its origin, collapses into this one shape so that
/// downstream handling (notifications, the tracking sheet) sees a single
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub step: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(step: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Terminal result of one workflow execution.
///
/// A run ends in exactly one of these states. This is the only externally
/// observable result; it drives the notification message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        video: MediaAsset,
        uploaded_ref: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        public_url: Option<String>,
    },
    NoWork,
    #[serde(rename_all = "camelCase")]
    Failure {
        failed_step: String,
        error: ErrorInfo,
    },
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_validation_rejects_empty_narration() {
        let script = ScriptArtifact {
            title: "t".to_string(),
            description: "d".to_string(),
            narration_text: "  ".to_string(),
            image_prompts: vec!["a cat".to_string()],
            tags: vec![],
            estimated_duration_seconds: 30,
        };
        assert!(script.validate().is_err());
    }

    #[test]
    fn script_validation_rejects_missing_image_prompts() {
        let script = ScriptArtifact {
            title: "t".to_string(),
            description: "d".to_string(),
            narration_text: "hello".to_string(),
            image_prompts: vec![],
            tags: vec![],
            estimated_duration_seconds: 30,
        };
        assert!(script.validate().is_err());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = WorkflowOutcome::Failure {
            failed_step: "GenerateScript".to_string(),
            error: ErrorInfo::new("GenerateScript", ErrorKind::Validation, "boom"),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "FAILURE");
        assert_eq!(value["failedStep"], "GenerateScript");
        assert_eq!(value["error"]["kind"], "VALIDATION");

        let no_work = serde_json::to_value(WorkflowOutcome::NoWork).unwrap();
        assert_eq!(no_work["status"], "NO_WORK");
    }

    #[test]
    fn work_item_round_trips_camel_case() {
        let json = serde_json::json!({
            "row": 7,
            "prompt": "space facts",
            "theme": "science",
            "durationSeconds": 60,
            "status": "TODO"
        });
        let item: WorkItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.row, 7);
        assert_eq!(item.status, RowStatus::Todo);
        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["durationSeconds"], 60);
    }
}
