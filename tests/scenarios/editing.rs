/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use euclid::default::Point2D;
use flowshell::app::{GraphIntent, WorkflowEditorApp};
use flowshell::graph::config::ConfigValue;
use flowshell::graph::error::GraphError;
use flowshell::input::{Key, KeyChord, collect_actions, intents_from_actions};
use flowshell::registries::atomic::node_type::NodeType;
use flowshell::test_utils::{demo_app, drag, node_by_label};

#[test]
fn llm_temperature_out_of_range_is_rejected_inline() {
    let mut app = WorkflowEditorApp::new();
    let id = app.add_node(NodeType::LlmCall, Point2D::new(700.0, 150.0), None);
    let end = app.add_node(NodeType::End, Point2D::new(900.0, 200.0), None);
    assert!(app.connect(id, end).unwrap());
    app.select_node(id);
    let entries = app.history().len();

    let err = app.edit_field(id, "temperature", "1.4").unwrap_err();
    assert!(matches!(err, GraphError::Validation(ref e) if e.field == "temperature"));
    let view = app.inspector_view().unwrap();
    let temperature = view.fields.iter().find(|f| f.name == "temperature").unwrap();
    assert_eq!(temperature.input, "1.4");
    assert!(temperature.error.is_some());
    assert_eq!(temperature.value, ConfigValue::Number(0.7));
    assert_eq!(app.history().len(), entries);

    app.edit_field(id, "temperature", "0.7").unwrap();
    let view = app.inspector_view().unwrap();
    assert!(view.fields.iter().all(|f| f.error.is_none()));
}

#[test]
fn dragging_a_node_records_one_undoable_move() {
    let mut app = WorkflowEditorApp::new();
    let id = app.add_node(NodeType::VectorSearch, Point2D::new(100.0, 200.0), None);
    let entries = app.history().len();

    drag(&mut app, Point2D::new(120.0, 230.0), Point2D::new(170.0, 290.0), 12);

    assert_eq!(app.graph().get_node(id).unwrap().position(), Point2D::new(150.0, 260.0));
    assert_eq!(app.history().len(), entries + 1);

    app.undo();
    assert_eq!(app.graph().get_node(id).unwrap().position(), Point2D::new(100.0, 200.0));
    app.redo();
    assert_eq!(app.graph().get_node(id).unwrap().position(), Point2D::new(150.0, 260.0));
}

#[test]
fn undo_then_redo_restores_every_intermediate_graph() {
    let mut app = demo_app();
    let router = node_by_label(app.graph(), "Router").unwrap();
    let gemini = node_by_label(app.graph(), "LLM: Gemini").unwrap();

    let mut snapshots = vec![app.graph().clone()];
    let tool = app.add_node(NodeType::ToolCall, Point2D::new(700.0, 500.0), None);
    snapshots.push(app.graph().clone());
    app.connect(router, tool).unwrap();
    snapshots.push(app.graph().clone());
    app.set_node_config(gemini, "maxTokens", ConfigValue::Number(512.0)).unwrap();
    snapshots.push(app.graph().clone());
    app.remove_node(router).unwrap();
    snapshots.push(app.graph().clone());

    for expected in snapshots.iter().rev().skip(1) {
        assert!(app.undo());
        assert_eq!(app.graph(), expected);
    }
    assert!(!app.undo());
    for expected in snapshots.iter().skip(1) {
        assert!(app.redo());
        assert_eq!(app.graph(), expected);
    }
    assert!(!app.redo());
}

#[test]
fn new_edit_after_undo_discards_redo() {
    let mut app = demo_app();
    app.add_node(NodeType::End, Point2D::new(0.0, 600.0), None);
    app.undo();
    assert!(app.history().can_redo());

    app.add_node(NodeType::Start, Point2D::new(0.0, 700.0), None);
    assert!(!app.history().can_redo());
}

#[test]
fn keyboard_delete_then_undo_brings_node_back() {
    let mut app = demo_app();
    let before = app.graph().clone();
    let router = node_by_label(app.graph(), "Router").unwrap();
    app.apply_intents([GraphIntent::SelectNode { id: router }]);

    let delete = collect_actions(&[KeyChord::plain(Key::Delete)], false);
    app.apply_intents(intents_from_actions(&delete));
    assert!(!app.graph().contains_node(router));

    let undo = collect_actions(&[KeyChord::ctrl(Key::Char('z'))], false);
    app.apply_intents(intents_from_actions(&undo));
    assert_eq!(app.graph(), &before);
}

#[test]
fn typing_in_inspector_does_not_delete_node() {
    let mut app = demo_app();
    let router = node_by_label(app.graph(), "Router").unwrap();
    app.select_node(router);

    let actions = collect_actions(&[KeyChord::plain(Key::Backspace)], true);
    app.apply_intents(intents_from_actions(&actions));

    assert!(app.graph().contains_node(router));
    assert_eq!(app.selection().selected(), Some(router));
}

#[test]
fn router_summary_tracks_branch_count() {
    let mut app = demo_app();
    let router = node_by_label(app.graph(), "Router").unwrap();
    let subtitle = |app: &WorkflowEditorApp| {
        app.scene()
            .nodes
            .iter()
            .find(|node| node.key == router)
            .map(|node| node.subtitle.clone())
            .unwrap()
    };
    assert_eq!(subtitle(&app), "2 branches");

    let openai = node_by_label(app.graph(), "LLM: OpenAI").unwrap();
    app.disconnect(router, openai);
    assert_eq!(subtitle(&app), "1 branch");
}
