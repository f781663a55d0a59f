/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Helpers shared by unit and scenario tests.

use euclid::default::Point2D;

use crate::app::WorkflowEditorApp;
use crate::graph::sample::demo_workflow;
use crate::graph::{Graph, NodeId};

/// Editor preloaded with the demo pipeline and empty history.
pub fn demo_app() -> WorkflowEditorApp {
    WorkflowEditorApp::from_graph("demo", demo_workflow())
}

/// Id of the first node carrying `label`.
pub fn node_by_label(graph: &Graph, label: &str) -> Option<NodeId> {
    graph
        .nodes()
        .find(|node| node.label() == label)
        .map(|node| node.id())
}

/// Press at `from`, move to `to` in `steps` even steps, release at `to`.
/// Positions are screen coordinates.
pub fn drag(app: &mut WorkflowEditorApp, from: Point2D<f32>, to: Point2D<f32>, steps: u32) {
    app.pointer_down(from);
    let steps = steps.max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        app.pointer_move(from.lerp(to, t));
    }
    app.pointer_up(to);
}
