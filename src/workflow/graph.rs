// Workflow graph - tagged-variant nodes with compile-time validation.
use std::collections::HashMap;

use super::error::GraphError;
use super::router::BranchRules;
use super::transform::FieldMapping;

/// Which terminal a `Terminal` node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Success,
    Failure,
    NoWork,
}

/// One node in the workflow graph.
///
/// A single variant set covers every stage the pipeline needs; there is one
/// graph definition, not one copy per deployment flavor.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Invoke the named step with the current payload.
    Task { step: String },
    /// Reshape the current payload with a declarative mapping.
    Transform { mapping: FieldMapping },
    /// Route on the previous result; first matching rule wins.
    Branch { rules: BranchRules },
    /// Fan the current payload out to every branch step concurrently.
    /// Output order follows declaration order, not completion order.
    Parallel { branches: Vec<String> },
    /// Terminal state; no transitions leave it.
    Terminal { kind: TerminalKind },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
}

/// Compiled, immutable workflow graph.
///
/// Built through `GraphBuilder`; a value of this type has passed validation,
/// so every reachable path ends in a terminal.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    nodes: HashMap<String, Node>,
    edges: HashMap<String, String>,
    entry: String,
}

impl WorkflowGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub fn entry_point(&self) -> &str {
        &self.entry
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Unconditional successor of a task, transform, or parallel node.
    pub fn next_of(&self, id: &str) -> Option<&str> {
        self.edges.get(id).map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn targets_of(&self, id: &str) -> Vec<&str> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Branch { rules }) => rules.targets().collect(),
            Some(NodeKind::Terminal { .. }) => Vec::new(),
            Some(_) => self.next_of(id).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

/// Builder mirroring the graph's construction order: declare nodes, connect
/// edges, set the entry point, then `build` to validate.
pub struct GraphBuilder {
    nodes: HashMap<String, Node>,
    edges: HashMap<String, String>,
    entry: Option<String>,
    duplicate: Option<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            duplicate: None,
        }
    }

    pub fn add_task(self, id: &str, step: &str) -> Self {
        self.add_node(id, NodeKind::Task { step: step.to_string() })
    }

    pub fn add_transform(self, id: &str, mapping: FieldMapping) -> Self {
        self.add_node(id, NodeKind::Transform { mapping })
    }

    pub fn add_branch(self, id: &str, rules: BranchRules) -> Self {
        self.add_node(id, NodeKind::Branch { rules })
    }

    pub fn add_parallel(self, id: &str, branches: Vec<&str>) -> Self {
        let branches = branches.into_iter().map(str::to_string).collect();
        self.add_node(id, NodeKind::Parallel { branches })
    }

    pub fn add_terminal(self, id: &str, kind: TerminalKind) -> Self {
        self.add_node(id, NodeKind::Terminal { kind })
    }

    fn add_node(mut self, id: &str, kind: NodeKind) -> Self {
        if self.nodes.contains_key(id) && self.duplicate.is_none() {
            self.duplicate = Some(id.to_string());
        }
        self.nodes.insert(id.to_string(), Node { id: id.to_string(), kind });
        self
    }

    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges.insert(from.to_string(), to.to_string());
        self
    }

    pub fn set_entry_point(mut self, id: &str) -> Self {
        self.entry = Some(id.to_string());
        self
    }

    /// Validate and freeze the graph.
    pub fn build(self) -> Result<WorkflowGraph, GraphError> {
        if let Some(id) = self.duplicate {
            return Err(GraphError::DuplicateNode(id));
        }
        let entry = self.entry.ok_or(GraphError::NoEntryPoint)?;
        if !self.nodes.contains_key(&entry) {
            return Err(GraphError::UnknownNode(entry));
        }

        for (from, to) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(GraphError::UnknownNode(from.clone()));
            }
            if !self.nodes.contains_key(to) {
                return Err(GraphError::UnknownNode(to.clone()));
            }
        }

        for node in self.nodes.values() {
            match &node.kind {
                NodeKind::Task { .. } | NodeKind::Transform { .. } => {
                    if !self.edges.contains_key(&node.id) {
                        return Err(GraphError::MissingContinuation(node.id.clone()));
                    }
                }
                NodeKind::Parallel { branches } => {
                    if branches.is_empty() {
                        return Err(GraphError::EmptyParallel(node.id.clone()));
                    }
                    let mut seen = std::collections::HashSet::new();
                    if !branches.iter().all(|b| seen.insert(b)) {
                        return Err(GraphError::DuplicateBranch(node.id.clone()));
                    }
                    if !self.edges.contains_key(&node.id) {
                        return Err(GraphError::MissingContinuation(node.id.clone()));
                    }
                }
                NodeKind::Branch { rules } => {
                    if self.edges.contains_key(&node.id) {
                        return Err(GraphError::BranchWithEdge(node.id.clone()));
                    }
                    for target in rules.targets() {
                        if !self.nodes.contains_key(target) {
                            return Err(GraphError::UnknownNode(target.to_string()));
                        }
                    }
                }
                NodeKind::Terminal { .. } => {
                    if self.edges.contains_key(&node.id) {
                        return Err(GraphError::TerminalWithEdge(node.id.clone()));
                    }
                }
            }
        }

        let graph = WorkflowGraph {
            nodes: self.nodes,
            edges: self.edges,
            entry,
        };
        graph.check_acyclic()?;
        Ok(graph)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowGraph {
    // Branch targets count as edges here, unlike a plain next-edge walk.
    // A cycle anywhere would let an execution run forever, so it is a
    // build-time error rather than a runtime guard.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut visited: HashMap<&str, bool> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();
        for id in self.nodes.keys() {
            self.dfs(id, &mut visited, &mut stack)?;
        }
        Ok(())
    }

    fn dfs<'a>(
        &'a self,
        id: &'a str,
        visited: &mut HashMap<&'a str, bool>,
        stack: &mut Vec<&'a str>,
    ) -> Result<(), GraphError> {
        if stack.contains(&id) {
            return Err(GraphError::CycleDetected(id.to_string()));
        }
        if visited.get(id).copied().unwrap_or(false) {
            return Ok(());
        }
        visited.insert(id, true);
        stack.push(id);
        for target in self.targets_of(id) {
            self.dfs(target, visited, stack)?;
        }
        stack.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::router::Condition;
    use serde_json::json;

    fn minimal() -> GraphBuilder {
        WorkflowGraph::builder()
            .add_task("A", "StepA")
            .add_terminal("Done", TerminalKind::Success)
            .add_edge("A", "Done")
            .set_entry_point("A")
    }

    #[test]
    fn minimal_graph_builds() {
        let graph = minimal().build().unwrap();
        assert_eq!(graph.entry_point(), "A");
        assert_eq!(graph.next_of("A"), Some("Done"));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn missing_entry_point_is_rejected() {
        let result = WorkflowGraph::builder()
            .add_terminal("Done", TerminalKind::Success)
            .build();
        assert_eq!(result.unwrap_err(), GraphError::NoEntryPoint);
    }

    #[test]
    fn edge_to_unknown_node_is_rejected() {
        let result = minimal().add_edge("Done", "Nowhere").build();
        assert!(matches!(result, Err(GraphError::UnknownNode(_))));
    }

    #[test]
    fn task_without_continuation_is_rejected() {
        let result = WorkflowGraph::builder()
            .add_task("A", "StepA")
            .set_entry_point("A")
            .build();
        assert_eq!(
            result.unwrap_err(),
            GraphError::MissingContinuation("A".to_string())
        );
    }

    #[test]
    fn terminal_with_edge_is_rejected() {
        let result = WorkflowGraph::builder()
            .add_task("A", "StepA")
            .add_terminal("Done", TerminalKind::Success)
            .add_edge("A", "Done")
            .add_edge("Done", "A")
            .set_entry_point("A")
            .build();
        assert!(matches!(result, Err(GraphError::TerminalWithEdge(_)) | Err(GraphError::CycleDetected(_))));
    }

    #[test]
    fn cycle_is_rejected_including_branch_targets() {
        let rules = BranchRules::new()
            .when(Condition::FieldEquals { path: "retry".into(), value: json!(true) }, "A")
            .otherwise("Done");
        let result = WorkflowGraph::builder()
            .add_task("A", "StepA")
            .add_branch("Check", rules)
            .add_terminal("Done", TerminalKind::Success)
            .add_edge("A", "Check")
            .set_entry_point("A")
            .build();
        assert!(matches!(result, Err(GraphError::CycleDetected(_))));
    }

    #[test]
    fn branch_with_unconditional_edge_is_rejected() {
        let rules = BranchRules::new().otherwise("Done");
        let result = WorkflowGraph::builder()
            .add_task("A", "StepA")
            .add_branch("Check", rules)
            .add_terminal("Done", TerminalKind::Success)
            .add_edge("A", "Check")
            .add_edge("Check", "Done")
            .set_entry_point("A")
            .build();
        assert_eq!(
            result.unwrap_err(),
            GraphError::BranchWithEdge("Check".to_string())
        );
    }

    #[test]
    fn parallel_requires_unique_branches() {
        let result = WorkflowGraph::builder()
            .add_parallel("Fan", vec!["X", "X"])
            .add_terminal("Done", TerminalKind::Success)
            .add_edge("Fan", "Done")
            .set_entry_point("Fan")
            .build();
        assert_eq!(
            result.unwrap_err(),
            GraphError::DuplicateBranch("Fan".to_string())
        );
    }
}
