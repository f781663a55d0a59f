/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Serializable types for workflow persistence.
//!
//! The document is the one artifact that must stay stable across versions.
//! Unknown fields are rejected so a typo never silently drops data.

use serde::{Deserialize, Serialize};

use crate::graph::config::NodeConfig;
use crate::graph::error::GraphError;

/// Current document format. Documents with a newer version are refused.
pub const WORKFLOW_FORMAT_VERSION: u32 = 1;

/// Persisted workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkflowDocument {
    pub format_version: u32,
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<PersistedNode>,
    #[serde(default)]
    pub edges: Vec<PersistedEdge>,
    /// Seconds since the Unix epoch at save time.
    #[serde(default)]
    pub saved_at_secs: u64,
}

/// Persisted node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedNode {
    /// Stable node identity (hyphenated UUID).
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub position: PersistedPosition,
    #[serde(default)]
    pub config: NodeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedPosition {
    pub x: f32,
    pub y: f32,
}

/// Persisted directed edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedEdge {
    pub from: String,
    pub to: String,
}

impl WorkflowDocument {
    /// Parse a JSON document. Missing required fields are a deserialization error.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::Deserialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "formatVersion": 1,
        "nodes": [
            {
                "id": "6f1c1a52-8f5e-4bb8-9d1c-1b1f6c0f2a11",
                "type": "llm-call",
                "label": "LLM",
                "position": { "x": 700, "y": 150 },
                "config": { "model": "GPT-4", "temperature": 0.7 }
            }
        ]
    }"#;

    #[test]
    fn test_minimal_document_parses_with_defaults() {
        let document = WorkflowDocument::from_json(MINIMAL).unwrap();

        assert_eq!(document.format_version, 1);
        assert!(document.name.is_empty());
        assert!(document.edges.is_empty());
        assert_eq!(document.nodes[0].node_type, "llm-call");
        assert_eq!(document.nodes[0].position, PersistedPosition { x: 700.0, y: 150.0 });
    }

    #[test]
    fn test_missing_required_field_is_deserialization_error() {
        let err = WorkflowDocument::from_json(r#"{"formatVersion": 1}"#).unwrap_err();
        assert!(matches!(err, GraphError::Deserialization(message) if message.contains("nodes")));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let json = MINIMAL.replace("\"label\": \"LLM\",", "\"label\": \"LLM\", \"colour\": \"red\",");
        assert!(WorkflowDocument::from_json(&json).is_err());
    }

    #[test]
    fn test_written_document_uses_camel_case_and_type_key() {
        let document = WorkflowDocument::from_json(MINIMAL).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&document.to_json_pretty().unwrap()).unwrap();

        assert_eq!(value["formatVersion"], 1);
        assert!(value.get("savedAtSecs").is_some());
        assert_eq!(value["nodes"][0]["type"], "llm-call");
    }
}
