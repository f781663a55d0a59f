/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Canvas rendering.
//!
//! Derives a `flow_canvas::CanvasScene` from the graph and selection on every
//! pass. The renderer keeps no copy of node data; its only mutable state is
//! transient hover feedback and the viewport.

pub mod inspector;
pub mod svg;

use euclid::default::Point2D;
use flow_canvas::{CanvasGeometry, CanvasScene, SceneBuilder, Viewport};

use crate::graph::{Graph, Node, NodeId};
use crate::input::Selection;
use crate::registries::atomic::node_type::NodeType;

pub struct CanvasRenderer {
    geometry: CanvasGeometry,
    viewport: Viewport,
    hovered: Option<NodeId>,
}

impl CanvasRenderer {
    pub fn new(geometry: CanvasGeometry) -> Self {
        Self {
            geometry,
            viewport: Viewport::new(),
            hovered: None,
        }
    }

    pub fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Build the scene for the current graph and selection.
    pub fn derive_scene(&self, graph: &Graph, selection: &Selection) -> CanvasScene<NodeId> {
        let mut builder = SceneBuilder::new(self.geometry)
            .selected(selection.selected())
            .hovered(self.hovered.filter(|id| graph.contains_node(*id)));
        for node in graph.nodes() {
            let schema = node.schema();
            builder = builder.node(
                node.id(),
                node.position(),
                node.label(),
                node_summary(graph, node),
                schema.icon,
            );
        }
        for (from, to) in graph.edges() {
            builder = builder.edge(from, to);
        }
        builder.build()
    }

    /// Topmost node under a canvas point.
    pub fn hit_test(&self, graph: &Graph, point: Point2D<f32>) -> Option<NodeId> {
        graph
            .nodes()
            .rev()
            .find(|node| self.geometry.node_contains(node.position(), point))
            .map(Node::id)
    }

    /// Update hover from a canvas point (`None` when the pointer left the
    /// canvas). Returns whether the hovered node changed.
    pub fn set_hover(&mut self, graph: &Graph, point: Option<Point2D<f32>>) -> bool {
        let hovered = point.and_then(|point| self.hit_test(graph, point));
        let changed = hovered != self.hovered;
        self.hovered = hovered;
        changed
    }

    pub fn forget(&mut self, id: NodeId) {
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }
}

impl Default for CanvasRenderer {
    fn default() -> Self {
        Self::new(CanvasGeometry::default())
    }
}

/// One-line body text shown under a node's title.
pub fn node_summary(graph: &Graph, node: &Node) -> String {
    match node.node_type() {
        NodeType::Router => {
            let branches = graph.out_neighbors(node.id()).count();
            if branches == 1 {
                "1 branch".to_string()
            } else {
                format!("{branches} branches")
            }
        },
        NodeType::LlmCall => match node.config_value("model") {
            Some(model) => format!("Model: {model}"),
            None => node.schema().display_label.to_string(),
        },
        _ => node.schema().display_label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::sample::demo_workflow;

    fn node_by_label<'a>(graph: &'a Graph, label: &str) -> &'a Node {
        graph.nodes().find(|node| node.label() == label).unwrap()
    }

    #[test]
    fn test_scene_follows_graph_order_and_positions() {
        let graph = demo_workflow();
        let scene = CanvasRenderer::default().derive_scene(&graph, &Selection::new());

        assert_eq!(scene.nodes.len(), 6);
        assert_eq!(scene.edges.len(), 6);
        assert_eq!(scene.nodes[0].title, "Ingest PDF");
        assert_eq!(scene.nodes[0].icon, "📄");
        assert_eq!(scene.nodes[0].rect.min, Point2D::new(100.0, 200.0));
        assert!(scene.nodes.iter().all(|node| !node.selected));
    }

    #[test]
    fn test_edges_run_from_right_center_to_left_center() {
        let graph = demo_workflow();
        let scene = CanvasRenderer::default().derive_scene(&graph, &Selection::new());
        let ingest = node_by_label(&graph, "Ingest PDF").id();
        let edge = scene.edges.iter().find(|edge| edge.from == ingest).unwrap();

        assert_eq!(edge.curve.start, Point2D::new(260.0, 240.0));
        assert_eq!(edge.curve.end, Point2D::new(300.0, 240.0));
        assert!(edge.curve.is_straight());
    }

    #[test]
    fn test_selection_is_reflected() {
        let graph = demo_workflow();
        let router = node_by_label(&graph, "Router").id();
        let mut selection = Selection::new();
        selection.select(router);

        let scene = CanvasRenderer::default().derive_scene(&graph, &selection);

        assert!(scene.node(router).unwrap().selected);
        assert_eq!(scene.nodes.iter().filter(|node| node.selected).count(), 1);
        assert_eq!(scene.edges.iter().filter(|edge| edge.highlighted).count(), 3);
    }

    #[test]
    fn test_summaries_come_from_config_and_edges() {
        let graph = demo_workflow();

        assert_eq!(node_summary(&graph, node_by_label(&graph, "Router")), "2 branches");
        assert_eq!(
            node_summary(&graph, node_by_label(&graph, "LLM: Gemini")),
            "Model: Gemini 1.5 Pro"
        );
        assert_eq!(node_summary(&graph, node_by_label(&graph, "Response")), "End");
    }

    #[test]
    fn test_hit_test_and_hover() {
        let graph = demo_workflow();
        let mut renderer = CanvasRenderer::default();
        let gemini = node_by_label(&graph, "LLM: Gemini").id();
        let openai = node_by_label(&graph, "LLM: OpenAI").id();

        // Gemini spans y 150..230 and OpenAI 250..330.
        assert_eq!(renderer.hit_test(&graph, Point2D::new(710.0, 160.0)), Some(gemini));
        assert_eq!(renderer.hit_test(&graph, Point2D::new(710.0, 240.0)), None);

        assert!(renderer.set_hover(&graph, Some(Point2D::new(800.0, 300.0))));
        assert_eq!(renderer.hovered(), Some(openai));
        assert!(!renderer.set_hover(&graph, Some(Point2D::new(801.0, 301.0))));

        let scene = renderer.derive_scene(&graph, &Selection::new());
        assert!(scene.node(openai).unwrap().hovered);

        assert!(renderer.set_hover(&graph, None));
        assert_eq!(renderer.hovered(), None);
    }

    #[test]
    fn test_scene_is_a_pure_function_of_graph_and_selection() {
        let graph = demo_workflow();
        let renderer = CanvasRenderer::default();
        let selection = Selection::new();

        assert_eq!(
            renderer.derive_scene(&graph, &selection),
            renderer.derive_scene(&graph, &selection)
        );
    }
}
