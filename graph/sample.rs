/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Demo workflow used by `flowshell new --demo` and tests.

use euclid::default::Point2D;

use super::Graph;
use super::config::ConfigValue;
use crate::registries::atomic::node_type::NodeType;

/// Retrieval pipeline fanning out to two LLM calls through a router.
pub fn demo_workflow() -> Graph {
    let mut graph = Graph::new();
    let ingest = graph.add_node(NodeType::Start, Point2D::new(100.0, 200.0), Some("Ingest PDF"));
    let search = graph.add_node(
        NodeType::VectorSearch,
        Point2D::new(300.0, 200.0),
        Some("Vector Search"),
    );
    let router = graph.add_node(NodeType::Router, Point2D::new(500.0, 200.0), Some("Router"));
    let gemini = graph.add_node(NodeType::LlmCall, Point2D::new(700.0, 150.0), Some("LLM: Gemini"));
    let openai = graph.add_node(NodeType::LlmCall, Point2D::new(700.0, 250.0), Some("LLM: OpenAI"));
    let response = graph.add_node(NodeType::End, Point2D::new(900.0, 200.0), Some("Response"));

    let configured = [
        (search, "collection", ConfigValue::text("documents")),
        (
            router,
            "routingExpression",
            ConfigValue::text("if query.is_technical -> LLM: Gemini\nelse -> LLM: OpenAI"),
        ),
        (gemini, "model", ConfigValue::text("Gemini 1.5 Pro")),
    ];
    for (id, field, value) in configured {
        if let Err(e) = graph.set_node_config(id, field, value) {
            log::warn!("Demo workflow config rejected: {e}");
        }
    }

    for (from, to) in [
        (ingest, search),
        (search, router),
        (router, gemini),
        (router, openai),
        (gemini, response),
        (openai, response),
    ] {
        if let Err(e) = graph.add_edge(from, to) {
            log::warn!("Demo workflow edge rejected: {e}");
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_workflow_has_six_nodes_and_six_edges() {
        let graph = demo_workflow();
        let labels: Vec<&str> = graph.nodes().map(|node| node.label()).collect();

        assert_eq!(
            labels,
            vec!["Ingest PDF", "Vector Search", "Router", "LLM: Gemini", "LLM: OpenAI", "Response"]
        );
        assert_eq!(graph.edge_count(), 6);
    }

    #[test]
    fn demo_router_fans_out_to_both_llm_calls() {
        let graph = demo_workflow();
        let router = graph
            .nodes()
            .find(|node| node.node_type() == NodeType::Router)
            .unwrap();

        assert_eq!(graph.out_neighbors(router.id()).count(), 2);
    }
}
