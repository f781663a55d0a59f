/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Workflow graph data structures.
//!
//! Core structures:
//! - `Graph`: node and edge container backed by petgraph::StableGraph
//! - `Node`: typed, positioned processing step with schema-driven config
//! - `NodeId`: stable identity that survives save/load and undo
//!
//! The graph is the only owner of node and edge lifetime. Every mutation is
//! apply-or-reject: a call that returns `Err` leaves the graph untouched.

use std::collections::{BTreeSet, HashMap, HashSet};

use euclid::default::Point2D;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registries::atomic::node_type::{NodeType, NodeTypeRegistry, NodeTypeSchema};
use crate::services::persistence::types::{
    PersistedEdge, PersistedNode, PersistedPosition, WORKFLOW_FORMAT_VERSION, WorkflowDocument,
};

pub mod config;
pub mod error;
pub mod sample;

use config::{ConfigValue, NodeConfig};
use error::GraphError;

/// Internal petgraph handle. Not stable across save/load; use `NodeId` outside the graph.
type NodeKey = NodeIndex;

/// Stable node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A workflow step.
///
/// `id` and `node_type` are fixed at creation; retyping is delete + create.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    node_type: NodeType,
    label: String,
    position: Point2D<f32>,
    config: NodeConfig,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn schema(&self) -> &'static NodeTypeSchema {
        self.node_type.schema()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Top-left corner in canvas units.
    pub fn position(&self) -> Point2D<f32> {
        self.position
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn config_value(&self, field: &str) -> Option<&ConfigValue> {
        self.config.get(field)
    }
}

/// Everything needed to put a removed node back exactly where it was.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub node: Node,
    /// Position in creation order.
    pub index: usize,
    /// Every edge that touched the node, as `(from, to)`.
    pub edges: Vec<(NodeId, NodeId)>,
}

/// Workflow graph backed by petgraph::StableGraph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: StableGraph<Node, (), Directed>,

    /// Stable id to node mapping.
    id_to_node: HashMap<NodeId, NodeKey>,

    /// Creation order. StableGraph reuses vacant slots, so index order alone
    /// does not preserve it.
    order: Vec<NodeId>,
}

fn sanitize_position(position: Point2D<f32>) -> Point2D<f32> {
    if position.x.is_finite() && position.y.is_finite() {
        return position;
    }
    log::warn!(
        "Replacing non-finite node position ({}, {}) with finite coordinates",
        position.x,
        position.y
    );
    Point2D::new(
        if position.x.is_finite() { position.x } else { 0.0 },
        if position.y.is_finite() { position.y } else { 0.0 },
    )
}

fn resolve_label(node_type: NodeType, label: Option<&str>) -> String {
    label
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .unwrap_or(node_type.schema().display_label)
        .to_string()
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with a fresh id, a default label from the type's display
    /// label, and config seeded from the schema's field defaults.
    pub fn add_node(
        &mut self,
        node_type: NodeType,
        position: Point2D<f32>,
        label: Option<&str>,
    ) -> NodeId {
        let id = NodeId::new();
        let node = Node {
            id,
            node_type,
            label: resolve_label(node_type, label),
            position: sanitize_position(position),
            config: node_type.schema().default_config(),
        };
        self.insert_node(node, self.order.len());
        id
    }

    /// Add a node by type tag (canonical or legacy).
    pub fn add_node_from_tag(
        &mut self,
        tag: &str,
        position: Point2D<f32>,
        label: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node_type = NodeTypeRegistry::global().resolve(tag)?;
        Ok(self.add_node(node_type, position, label))
    }

    /// Insert a fully formed node at `index` in creation order.
    ///
    /// Used by history to replay an add or restore a removal with the same id.
    pub(crate) fn insert_node(&mut self, node: Node, index: usize) {
        let id = node.id;
        if self.id_to_node.contains_key(&id) {
            log::warn!("Ignoring insert of duplicate node {id}");
            return;
        }
        let key = self.inner.add_node(node);
        self.id_to_node.insert(id, key);
        self.order.insert(index.min(self.order.len()), id);
    }

    /// Put back a node removed by `remove_node`, with all of its edges.
    pub(crate) fn restore_node(&mut self, removed: &RemovedNode) {
        self.insert_node(removed.node.clone(), removed.index);
        for &(from, to) in &removed.edges {
            if let Err(e) = self.add_edge(from, to) {
                log::warn!("Could not restore edge {from} -> {to}: {e}");
            }
        }
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<RemovedNode, GraphError> {
        let key = self.key(id)?;
        let index = self.node_index(id).ok_or(GraphError::NotFound(id))?;

        let mut edges: Vec<(NodeId, NodeId)> = self.out_neighbors(id).map(|to| (id, to)).collect();
        edges.extend(self.in_neighbors(id).map(|from| (from, id)));

        let node = self.inner.remove_node(key).ok_or(GraphError::NotFound(id))?;
        self.id_to_node.remove(&id);
        self.order.remove(index);
        Ok(RemovedNode { node, index, edges })
    }

    /// Overwrite a node's position. Returns the previous position.
    pub fn move_node(
        &mut self,
        id: NodeId,
        position: Point2D<f32>,
    ) -> Result<Point2D<f32>, GraphError> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.position, sanitize_position(position)))
    }

    /// Add a directed edge. Returns `false` when the edge already existed.
    ///
    /// Unknown endpoints are reported before self-loops.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<bool, GraphError> {
        let from_key = self.key(from)?;
        let to_key = self.key(to)?;
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        if self.inner.find_edge(from_key, to_key).is_some() {
            return Ok(false);
        }
        self.inner.add_edge(from_key, to_key, ());
        Ok(true)
    }

    /// Remove a directed edge. Returns whether an edge was removed; missing
    /// edges and unknown endpoints are not errors.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        let (Some(&from_key), Some(&to_key)) = (self.id_to_node.get(&from), self.id_to_node.get(&to))
        else {
            return false;
        };
        match self.inner.find_edge(from_key, to_key) {
            Some(edge) => self.inner.remove_edge(edge).is_some(),
            None => false,
        }
    }

    /// Validate `value` against the node type's field constraint and store it.
    ///
    /// Returns the previous value of the field.
    pub fn set_node_config(
        &mut self,
        id: NodeId,
        field: &str,
        value: ConfigValue,
    ) -> Result<Option<ConfigValue>, GraphError> {
        let node = self.node_mut(id)?;
        node.schema().validate_field(field, &value)?;
        Ok(node.config.insert(field.to_string(), value))
    }

    /// Write a config value without validation. `None` removes the field.
    ///
    /// Only for restoring a value the graph held before.
    pub(crate) fn put_config(
        &mut self,
        id: NodeId,
        field: &str,
        value: Option<ConfigValue>,
    ) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        match value {
            Some(value) => node.config.insert(field.to_string(), value),
            None => node.config.remove(field),
        };
        Ok(())
    }

    /// Rename a node. The label is trimmed and an empty label falls back to
    /// the type's display label. Returns the previous label.
    pub fn set_node_label(&mut self, id: NodeId, label: &str) -> Result<String, GraphError> {
        let node = self.node_mut(id)?;
        let label = resolve_label(node.node_type, Some(label));
        Ok(std::mem::replace(&mut node.label, label))
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        let key = self.id_to_node.get(&id)?;
        self.inner.node_weight(*key)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.id_to_node.contains_key(&id)
    }

    /// Position of `id` in creation order.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|id| self.get_node(*id))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// Edges as `(from, to)`, grouped by source in creation order.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::with_capacity(self.inner.edge_count());
        for from in &self.order {
            let mut targets: Vec<(usize, NodeId)> = self
                .out_neighbors(*from)
                .map(|to| (self.node_index(to).unwrap_or(usize::MAX), to))
                .collect();
            targets.sort();
            edges.extend(targets.into_iter().map(|(_, to)| (*from, to)));
        }
        edges
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        match (self.id_to_node.get(&from), self.id_to_node.get(&to)) {
            (Some(from_key), Some(to_key)) => self.inner.find_edge(*from_key, *to_key).is_some(),
            _ => false,
        }
    }

    pub fn out_neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors(id, Direction::Outgoing)
    }

    pub fn in_neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors(id, Direction::Incoming)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node ids in visit order: Kahn's topological order, ties broken by
    /// creation order. When only cycle members remain, the earliest of them
    /// is emitted next, so every node appears exactly once.
    pub fn visit_order(&self) -> Vec<NodeId> {
        let mut in_degree: Vec<usize> = self
            .order
            .iter()
            .map(|id| self.in_neighbors(*id).count())
            .collect();
        let mut emitted = vec![false; self.order.len()];
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| index)
            .collect();
        let mut visit = Vec::with_capacity(self.order.len());

        while visit.len() < self.order.len() {
            let next = match ready.pop_first() {
                Some(index) => index,
                None => match emitted.iter().position(|done| !done) {
                    Some(index) => index,
                    None => break,
                },
            };
            if emitted[next] {
                continue;
            }
            emitted[next] = true;
            let id = self.order[next];
            visit.push(id);

            for successor in self.out_neighbors(id) {
                let Some(index) = self.node_index(successor) else {
                    continue;
                };
                in_degree[index] = in_degree[index].saturating_sub(1);
                if in_degree[index] == 0 && !emitted[index] {
                    ready.insert(index);
                }
            }
        }
        visit
    }

    /// Serialize to a persisted document.
    pub fn to_document(&self, name: &str) -> WorkflowDocument {
        let nodes = self
            .nodes()
            .map(|node| PersistedNode {
                id: node.id.to_string(),
                node_type: node.node_type.tag().to_string(),
                label: node.label.clone(),
                position: PersistedPosition {
                    x: node.position.x,
                    y: node.position.y,
                },
                config: node.config.clone(),
            })
            .collect();

        let edges = self
            .edges()
            .into_iter()
            .map(|(from, to)| PersistedEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect();

        let saved_at_secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        WorkflowDocument {
            format_version: WORKFLOW_FORMAT_VERSION,
            name: name.to_string(),
            nodes,
            edges,
            saved_at_secs,
        }
    }

    /// Rebuild a graph from a persisted document.
    ///
    /// Bypasses history. Rejects the whole document on the first structural
    /// problem: unsupported version, bad or duplicate ids, unknown types,
    /// non-finite positions, invalid config, and dangling or self-loop edges.
    pub fn from_document(document: &WorkflowDocument) -> Result<Self, GraphError> {
        if document.format_version == 0 || document.format_version > WORKFLOW_FORMAT_VERSION {
            return Err(GraphError::Deserialization(format!(
                "unsupported formatVersion {} (expected at most {WORKFLOW_FORMAT_VERSION})",
                document.format_version
            )));
        }

        let registry = NodeTypeRegistry::global();
        let mut graph = Graph::new();

        for (position, pnode) in document.nodes.iter().enumerate() {
            let malformed =
                |reason: String| GraphError::Deserialization(format!("node #{position}: {reason}"));

            let id = NodeId::parse(&pnode.id)
                .ok_or_else(|| malformed(format!("invalid id {:?}", pnode.id)))?;
            if graph.contains_node(id) {
                return Err(malformed(format!("duplicate id {id}")));
            }
            let node_type = registry
                .resolve(&pnode.node_type)
                .map_err(|_| malformed(format!("unknown type {:?}", pnode.node_type)))?;
            let schema = node_type.schema();

            let (x, y) = (pnode.position.x, pnode.position.y);
            if !x.is_finite() || !y.is_finite() {
                return Err(malformed("position is not finite".to_string()));
            }

            let mut config = schema.default_config();
            for (field, value) in &pnode.config {
                schema
                    .validate_field(field, value)
                    .map_err(|e| malformed(format!("config {e}")))?;
                config.insert(field.clone(), value.clone());
            }

            graph.insert_node(
                Node {
                    id,
                    node_type,
                    label: resolve_label(node_type, Some(&pnode.label)),
                    position: Point2D::new(x, y),
                    config,
                },
                graph.order.len(),
            );
        }

        for (position, pedge) in document.edges.iter().enumerate() {
            let endpoint = |raw: &str| {
                NodeId::parse(raw)
                    .filter(|id| graph.contains_node(*id))
                    .ok_or_else(|| {
                        GraphError::Deserialization(format!(
                            "edge #{position}: endpoint {raw:?} is not a node"
                        ))
                    })
            };
            let from = endpoint(&pedge.from)?;
            let to = endpoint(&pedge.to)?;
            graph.add_edge(from, to).map_err(|e| {
                GraphError::Deserialization(format!("edge #{position}: {e}"))
            })?;
        }

        Ok(graph)
    }

    fn key(&self, id: NodeId) -> Result<NodeKey, GraphError> {
        self.id_to_node
            .get(&id)
            .copied()
            .ok_or(GraphError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        let key = self.key(id)?;
        self.inner
            .node_weight_mut(key)
            .ok_or(GraphError::NotFound(id))
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> impl Iterator<Item = NodeId> + '_ {
        self.id_to_node
            .get(&id)
            .into_iter()
            .flat_map(move |key| self.inner.neighbors_directed(*key, direction))
            .map(move |key| self.inner[key].id)
    }

    fn edge_set(&self) -> HashSet<(NodeId, NodeId)> {
        self.inner
            .edge_references()
            .map(|edge| (self.inner[edge.source()].id, self.inner[edge.target()].id))
            .collect()
    }
}

/// Structural equality: same nodes in the same order, same edge set.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes().eq(other.nodes()) && self.edge_set() == other.edge_set()
    }
}
