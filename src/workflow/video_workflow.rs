// The production video generation workflow definition.
use serde_json::json;

use super::error::GraphError;
use super::graph::{TerminalKind, WorkflowGraph};
use super::router::{BranchRules, Condition};
use super::transform::FieldMapping;

/// Build the spreadsheet-to-YouTube pipeline graph.
///
/// Backbone: read a pending row, generate a script, persist it, generate
/// images and narration in parallel, compose the video, upload it. A row
/// source with nothing pending short-circuits to the no-work terminal before
/// any generation runs; a non-200 script result routes to the failure
/// terminal with a normalized error payload. The transforms between tasks
/// are the shape contract between collaborators: each one picks exactly the
/// fields the next step consumes and drops everything else.
pub fn build_video_workflow() -> Result<WorkflowGraph, GraphError> {
    let check_work_item = BranchRules::new()
        .when(
            Condition::FieldEquals { path: "hasData".to_string(), value: json!(false) },
            "NoWork",
        )
        .otherwise("TransformForScript");

    let check_script_result = BranchRules::new()
        .when(Condition::StatusEquals(200), "TransformForPersist")
        .otherwise("Failure");

    let transform_for_script = FieldMapping::new()
        .map("prompt", "rowData.prompt")
        .map("theme", "rowData.theme")
        .map("durationSeconds", "rowData.durationSeconds")
        .map("executionId", "executionId")
        .map("rowData", "rowData")
        .map("sourceId", "sourceId");

    let transform_for_persist = FieldMapping::new()
        .map("script", "body.script")
        .map("rowData", "rowData")
        .map("sourceId", "sourceId")
        .map("executionId", "executionId");

    let transform_for_parallel = FieldMapping::new()
        .map("imagePrompts", "script.imagePrompts")
        .map("narrationText", "script.narrationText")
        .map("title", "script.title")
        .map("description", "script.description")
        .map("tags", "script.tags")
        .map("executionId", "executionId");

    // Join results arrive as [images, audio] in branch-declaration order.
    let combine_results = FieldMapping::new()
        .map("images", "0.images")
        .map("audio", "1.audio")
        .map("title", "0.title")
        .map("description", "0.description")
        .map("tags", "0.tags")
        .map("executionId", "0.executionId");

    let transform_for_upload = FieldMapping::new()
        .map("video", "video")
        .map("title", "title")
        .map("description", "description")
        .map("tags", "tags")
        .map("executionId", "executionId");

    WorkflowGraph::builder()
        .add_task("ReadWorkItem", "ReadWorkItem")
        .add_branch("CheckWorkItem", check_work_item)
        .add_transform("TransformForScript", transform_for_script)
        .add_task("GenerateScript", "GenerateScript")
        .add_branch("CheckScriptResult", check_script_result)
        .add_transform("TransformForPersist", transform_for_persist)
        .add_task("PersistScript", "PersistScript")
        .add_transform("TransformForParallel", transform_for_parallel)
        .add_parallel("ParallelGenerate", vec!["GenerateImages", "SynthesizeAudio"])
        .add_transform("CombineResults", combine_results)
        .add_task("ComposeVideo", "ComposeVideo")
        .add_transform("TransformForUpload", transform_for_upload)
        .add_task("UploadVideo", "UploadVideo")
        .add_terminal("Success", TerminalKind::Success)
        .add_terminal("Failure", TerminalKind::Failure)
        .add_terminal("NoWork", TerminalKind::NoWork)
        .add_edge("ReadWorkItem", "CheckWorkItem")
        .add_edge("TransformForScript", "GenerateScript")
        .add_edge("GenerateScript", "CheckScriptResult")
        .add_edge("TransformForPersist", "PersistScript")
        .add_edge("PersistScript", "TransformForParallel")
        .add_edge("TransformForParallel", "ParallelGenerate")
        .add_edge("ParallelGenerate", "CombineResults")
        .add_edge("CombineResults", "ComposeVideo")
        .add_edge("ComposeVideo", "TransformForUpload")
        .add_edge("TransformForUpload", "UploadVideo")
        .add_edge("UploadVideo", "Success")
        .set_entry_point("ReadWorkItem")
        .build()
}
