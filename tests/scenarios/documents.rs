/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use euclid::default::Point2D;
use flowshell::app::WorkflowEditorApp;
use flowshell::graph::Graph;
use flowshell::persistence::WorkflowStore;
use flowshell::registries::atomic::node_type::NodeType;
use flowshell::services::persistence::types::WorkflowDocument;
use flowshell::test_utils::{demo_app, node_by_label};
use tempfile::TempDir;

#[test]
fn failed_load_leaves_editor_untouched() {
    let mut app = demo_app();
    let router = node_by_label(app.graph(), "Router").unwrap();
    app.select_node(router);
    app.add_node(NodeType::ToolCall, Point2D::new(0.0, 600.0), None);
    let before = app.graph().clone();

    let json = r#"{
        "formatVersion": 1,
        "name": "bad",
        "nodes": [
            { "id": "6b1d0c44-3f0e-4a55-9c1f-1d2f3e4a5b6c", "type": "teleport",
              "label": "?", "position": { "x": 0, "y": 0 } }
        ]
    }"#;
    let document = WorkflowDocument::from_json(json).unwrap();

    assert!(app.load_document(&document).is_err());
    assert_eq!(app.graph(), &before);
    assert_eq!(app.selection().selected(), Some(router));
    assert!(app.history().can_undo());
}

#[test]
fn legacy_type_tags_load() {
    let json = r#"{
        "formatVersion": 1,
        "name": "legacy",
        "nodes": [
            { "id": "6b1d0c44-3f0e-4a55-9c1f-1d2f3e4a5b6c", "type": "ingest",
              "label": "Ingest PDF", "position": { "x": 100, "y": 200 } },
            { "id": "0f4c2a1e-8d7b-4c6a-b5e4-f3a2b1c0d9e8", "type": "response",
              "label": "Response", "position": { "x": 400, "y": 200 } }
        ],
        "edges": [
            { "from": "6b1d0c44-3f0e-4a55-9c1f-1d2f3e4a5b6c",
              "to": "0f4c2a1e-8d7b-4c6a-b5e4-f3a2b1c0d9e8" }
        ]
    }"#;
    let graph = Graph::from_document(&WorkflowDocument::from_json(json).unwrap()).unwrap();

    let types: Vec<NodeType> = graph.nodes().map(|node| node.node_type()).collect();
    assert_eq!(types, vec![NodeType::Start, NodeType::End]);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn edited_workflow_survives_save_and_reopen() {
    let dir = TempDir::new().unwrap();
    let store = WorkflowStore::open(dir.path().join("workflows")).unwrap();

    let mut app = demo_app();
    let gemini = node_by_label(app.graph(), "LLM: Gemini").unwrap();
    app.edit_field(gemini, "temperature", "0.25").unwrap();
    app.set_node_label(gemini, "LLM: Gemini Pro").unwrap();
    app.save(&store).unwrap();

    let mut reopened = WorkflowEditorApp::new();
    reopened.open(&store, "demo").unwrap();

    assert_eq!(reopened.graph(), app.graph());
    assert_eq!(reopened.graph().visit_order(), app.graph().visit_order());
    assert!(!reopened.history().can_undo());
}
