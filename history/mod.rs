/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Linear undo/redo log of reversible graph mutations.
//!
//! Each entry carries enough state to both re-apply and invert itself, so
//! history never snapshots the whole graph. Pushing after an undo discards
//! the redo tail; there is no branching.

use euclid::default::Point2D;

use crate::graph::config::ConfigValue;
use crate::graph::error::GraphError;
use crate::graph::{Graph, Node, NodeId, RemovedNode};

/// Default number of entries kept before the oldest are dropped.
pub const MAX_UNDO_STEPS: usize = 128;

/// One reversible mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphCommand {
    AddNode {
        node: Node,
        index: usize,
    },
    RemoveNode {
        removed: RemovedNode,
    },
    MoveNode {
        id: NodeId,
        from: Point2D<f32>,
        to: Point2D<f32>,
    },
    AddEdge {
        from: NodeId,
        to: NodeId,
    },
    RemoveEdge {
        from: NodeId,
        to: NodeId,
    },
    EditConfig {
        id: NodeId,
        field: String,
        before: Option<ConfigValue>,
        after: ConfigValue,
    },
    RenameNode {
        id: NodeId,
        before: String,
        after: String,
    },
}

impl GraphCommand {
    pub fn label(&self) -> &'static str {
        match self {
            GraphCommand::AddNode { .. } => "add-node",
            GraphCommand::RemoveNode { .. } => "remove-node",
            GraphCommand::MoveNode { .. } => "move-node",
            GraphCommand::AddEdge { .. } => "add-edge",
            GraphCommand::RemoveEdge { .. } => "remove-edge",
            GraphCommand::EditConfig { .. } => "edit-config",
            GraphCommand::RenameNode { .. } => "rename-node",
        }
    }

    /// Re-apply the mutation.
    pub fn apply(&self, graph: &mut Graph) -> Result<(), GraphError> {
        match self {
            GraphCommand::AddNode { node, index } => {
                graph.insert_node(node.clone(), *index);
            },
            GraphCommand::RemoveNode { removed } => {
                graph.remove_node(removed.node.id())?;
            },
            GraphCommand::MoveNode { id, to, .. } => {
                graph.move_node(*id, *to)?;
            },
            GraphCommand::AddEdge { from, to } => {
                graph.add_edge(*from, *to)?;
            },
            GraphCommand::RemoveEdge { from, to } => {
                graph.remove_edge(*from, *to);
            },
            GraphCommand::EditConfig {
                id, field, after, ..
            } => {
                graph.put_config(*id, field, Some(after.clone()))?;
            },
            GraphCommand::RenameNode { id, after, .. } => {
                graph.set_node_label(*id, after)?;
            },
        }
        Ok(())
    }

    /// Apply the inverse mutation.
    pub fn revert(&self, graph: &mut Graph) -> Result<(), GraphError> {
        match self {
            GraphCommand::AddNode { node, .. } => {
                graph.remove_node(node.id())?;
            },
            GraphCommand::RemoveNode { removed } => {
                graph.restore_node(removed);
            },
            GraphCommand::MoveNode { id, from, .. } => {
                graph.move_node(*id, *from)?;
            },
            GraphCommand::AddEdge { from, to } => {
                graph.remove_edge(*from, *to);
            },
            GraphCommand::RemoveEdge { from, to } => {
                graph.add_edge(*from, *to)?;
            },
            GraphCommand::EditConfig {
                id, field, before, ..
            } => {
                graph.put_config(*id, field, before.clone())?;
            },
            GraphCommand::RenameNode { id, before, .. } => {
                graph.set_node_label(*id, before)?;
            },
        }
        Ok(())
    }

    /// Node the command is about, for edges the source.
    pub fn subject(&self) -> NodeId {
        match self {
            GraphCommand::AddNode { node, .. } => node.id(),
            GraphCommand::RemoveNode { removed } => removed.node.id(),
            GraphCommand::MoveNode { id, .. }
            | GraphCommand::EditConfig { id, .. }
            | GraphCommand::RenameNode { id, .. } => *id,
            GraphCommand::AddEdge { from, .. } | GraphCommand::RemoveEdge { from, .. } => *from,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: Vec<GraphCommand>,
    /// Number of entries currently applied; entries at and past it form the redo tail.
    cursor: usize,
    limit: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::with_limit(MAX_UNDO_STEPS)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record a mutation that has already been applied to the graph.
    pub fn push(&mut self, command: GraphCommand) {
        log::debug!("history: push {}", command.label());
        self.entries.truncate(self.cursor);
        self.entries.push(command);
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(0..excess);
        }
        self.cursor = self.entries.len();
    }

    /// Apply `command` to `graph` and record it when it succeeds.
    pub fn execute(&mut self, graph: &mut Graph, command: GraphCommand) -> Result<(), GraphError> {
        command.apply(graph)?;
        self.push(command);
        Ok(())
    }

    /// Step back one entry. Returns the undone entry's label, or `None` at the
    /// start of history.
    pub fn undo(&mut self, graph: &mut Graph) -> Option<&'static str> {
        let index = self.cursor.checked_sub(1)?;
        let command = &self.entries[index];
        if let Err(e) = command.revert(graph) {
            log::warn!("history: undo of {} failed ({e}); clearing history", command.label());
            self.clear();
            return None;
        }
        self.cursor = index;
        Some(self.entries[index].label())
    }

    /// Re-apply the next entry. Returns its label, or `None` at the end of
    /// history.
    pub fn redo(&mut self, graph: &mut Graph) -> Option<&'static str> {
        let command = self.entries.get(self.cursor)?;
        if let Err(e) = command.apply(graph) {
            log::warn!("history: redo of {} failed ({e}); clearing history", command.label());
            self.clear();
            return None;
        }
        let label = command.label();
        self.cursor += 1;
        Some(label)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Applied entries, oldest first.
    pub fn undo_entries(&self) -> &[GraphCommand] {
        &self.entries[..self.cursor]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::atomic::node_type::NodeType;

    fn two_nodes() -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new();
        let a = graph.add_node(NodeType::LlmCall, Point2D::new(100.0, 200.0), None);
        let b = graph.add_node(NodeType::End, Point2D::new(300.0, 200.0), None);
        (graph, a, b)
    }

    fn move_command(id: NodeId, x: f32) -> GraphCommand {
        GraphCommand::MoveNode {
            id,
            from: Point2D::new(x - 1.0, 0.0),
            to: Point2D::new(x, 0.0),
        }
    }

    #[test]
    fn test_empty_history_boundaries_are_noops() {
        let (mut graph, _, _) = two_nodes();
        let before = graph.clone();
        let mut history = CommandHistory::new();

        assert_eq!(history.undo(&mut graph), None);
        assert_eq!(history.redo(&mut graph), None);
        assert_eq!(graph, before);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_add_edge() {
        let (mut graph, a, b) = two_nodes();
        let before = graph.clone();
        let mut history = CommandHistory::new();

        history
            .execute(&mut graph, GraphCommand::AddEdge { from: a, to: b })
            .unwrap();
        let after = graph.clone();

        assert_eq!(history.undo(&mut graph), Some("add-edge"));
        assert_eq!(graph, before);
        assert_eq!(history.redo(&mut graph), Some("add-edge"));
        assert_eq!(graph, after);
    }

    #[test]
    fn test_undo_remove_node_restores_edges_and_order() {
        let (mut graph, a, b) = two_nodes();
        graph.add_edge(a, b).unwrap();
        let before = graph.clone();
        let mut history = CommandHistory::new();

        let removed = graph.remove_node(a).unwrap();
        history.push(GraphCommand::RemoveNode { removed });

        history.undo(&mut graph);
        assert_eq!(graph, before);
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![a, b]);

        history.redo(&mut graph);
        assert!(!graph.contains_node(a));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_undo_edit_config_restores_previous_value() {
        let (mut graph, a, _) = two_nodes();
        let before = graph.clone();
        let mut history = CommandHistory::new();

        let previous = graph
            .set_node_config(a, "temperature", ConfigValue::Number(0.2))
            .unwrap();
        history.push(GraphCommand::EditConfig {
            id: a,
            field: "temperature".to_string(),
            before: previous,
            after: ConfigValue::Number(0.2),
        });

        history.undo(&mut graph);
        assert_eq!(graph, before);
    }

    #[test]
    fn test_undo_rename_node() {
        let (mut graph, a, _) = two_nodes();
        let mut history = CommandHistory::new();
        let before = graph.set_node_label(a, "LLM: Gemini").unwrap();
        history.push(GraphCommand::RenameNode {
            id: a,
            before,
            after: "LLM: Gemini".to_string(),
        });

        history.undo(&mut graph);
        assert_eq!(graph.get_node(a).unwrap().label(), "LLM");
        history.redo(&mut graph);
        assert_eq!(graph.get_node(a).unwrap().label(), "LLM: Gemini");
    }

    #[test]
    fn test_push_truncates_redo_tail() {
        let (mut graph, a, _) = two_nodes();
        let mut history = CommandHistory::new();
        history.execute(&mut graph, move_command(a, 1.0)).unwrap();
        history.execute(&mut graph, move_command(a, 2.0)).unwrap();
        history.undo(&mut graph);
        assert!(history.can_redo());

        history.execute(&mut graph, move_command(a, 3.0)).unwrap();

        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.redo(&mut graph), None);
    }

    #[test]
    fn test_limit_drops_oldest_entries() {
        let (mut graph, a, _) = two_nodes();
        let mut history = CommandHistory::with_limit(3);
        for step in 1..=5 {
            history.execute(&mut graph, move_command(a, step as f32)).unwrap();
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 3);
        assert_eq!(history.undo_entries()[0], move_command(a, 3.0));
    }

    #[test]
    fn test_failed_revert_clears_history() {
        let (mut graph, a, _) = two_nodes();
        let mut history = CommandHistory::new();
        history.execute(&mut graph, move_command(a, 5.0)).unwrap();
        graph.remove_node(a).unwrap();

        assert_eq!(history.undo(&mut graph), None);
        assert!(history.is_empty());
    }

    #[test]
    fn test_failed_execute_records_nothing() {
        let (mut graph, a, _) = two_nodes();
        let mut history = CommandHistory::new();

        let err = history.execute(&mut graph, GraphCommand::AddEdge { from: a, to: a });
        assert_eq!(err, Err(GraphError::SelfLoop(a)));
        assert!(history.is_empty());
    }
}
