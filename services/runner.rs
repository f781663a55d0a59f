/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Run invocation boundary.
//!
//! The editor hands a structurally valid document to an external execution
//! engine through [`WorkflowRunner`]. Nothing here executes a workflow; the
//! bundled [`DryRunRunner`] only reports the order steps would be visited in.

use serde::Serialize;
use uuid::Uuid;

use crate::graph::{Graph, NodeId};
use crate::services::persistence::types::WorkflowDocument;

/// A workflow ready to hand to an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub workflow: String,
    pub document: WorkflowDocument,
}

impl RunRequest {
    /// Snapshot `graph` for a run. The graph never holds dangling edges, so
    /// the resulting document is always structurally valid.
    pub fn from_graph(workflow: &str, graph: &Graph) -> Self {
        Self {
            workflow: workflow.to_string(),
            document: graph.to_document(workflow),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReceipt {
    pub run_id: Uuid,
    pub workflow: String,
    pub status: RunStatus,
    /// Node ids in the order the engine visits them.
    pub visit_order: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    /// The request document could not be turned back into a graph.
    InvalidDocument(String),
    /// Nothing to run.
    EmptyWorkflow,
    /// The engine refused or failed the run.
    Engine(String),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::InvalidDocument(e) => write!(f, "Invalid workflow document: {e}"),
            RunError::EmptyWorkflow => write!(f, "Workflow has no nodes"),
            RunError::Engine(e) => write!(f, "Execution engine error: {e}"),
        }
    }
}

impl std::error::Error for RunError {}

pub trait WorkflowRunner {
    fn run(&self, request: &RunRequest) -> Result<RunReceipt, RunError>;
}

/// Runner that performs no execution and always completes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl WorkflowRunner for DryRunRunner {
    fn run(&self, request: &RunRequest) -> Result<RunReceipt, RunError> {
        let graph = Graph::from_document(&request.document)
            .map_err(|e| RunError::InvalidDocument(e.to_string()))?;
        if graph.is_empty() {
            return Err(RunError::EmptyWorkflow);
        }

        let receipt = RunReceipt {
            run_id: Uuid::new_v4(),
            workflow: request.workflow.clone(),
            status: RunStatus::Completed,
            visit_order: graph.visit_order(),
        };
        log::info!(
            "Dry run {} of {:?}: {} steps",
            receipt.run_id,
            receipt.workflow,
            receipt.visit_order.len()
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::sample::demo_workflow;

    #[test]
    fn dry_run_completes_in_topological_order() {
        let graph = demo_workflow();
        let receipt = DryRunRunner
            .run(&RunRequest::from_graph("demo", &graph))
            .unwrap();

        assert_eq!(receipt.status, RunStatus::Completed);
        assert_eq!(receipt.workflow, "demo");
        let labels: Vec<&str> = receipt
            .visit_order
            .iter()
            .map(|id| graph.get_node(*id).unwrap().label())
            .collect();
        assert_eq!(
            labels,
            vec!["Ingest PDF", "Vector Search", "Router", "LLM: Gemini", "LLM: OpenAI", "Response"]
        );
    }

    #[test]
    fn dry_run_rejects_empty_workflow() {
        let result = DryRunRunner.run(&RunRequest::from_graph("empty", &Graph::new()));
        assert_eq!(result, Err(RunError::EmptyWorkflow));
    }

    #[test]
    fn dry_run_rejects_tampered_document() {
        let mut request = RunRequest::from_graph("demo", &demo_workflow());
        request.document.nodes[0].id = "not-a-uuid".to_string();

        assert!(matches!(DryRunRunner.run(&request), Err(RunError::InvalidDocument(_))));
    }

    #[test]
    fn receipt_serializes_status_lowercase() {
        let receipt = DryRunRunner
            .run(&RunRequest::from_graph("demo", &demo_workflow()))
            .unwrap();
        let json = serde_json::to_value(&receipt).unwrap();

        assert_eq!(json["status"], "completed");
        assert_eq!(json["visitOrder"].as_array().unwrap().len(), 6);
    }
}
