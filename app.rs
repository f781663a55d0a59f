/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Application state for the workflow editor.
//!
//! `WorkflowEditorApp` owns the graph and everything derived from it:
//! selection, undo history, inspector errors and the canvas renderer. Every
//! user-visible mutation goes through it so history stays in step with the
//! graph. Frontends either call the methods directly or queue
//! [`GraphIntent`]s and hand them to [`WorkflowEditorApp::apply_intents`].

use std::path::PathBuf;

use euclid::default::{Point2D, Vector2D};
use log::{debug, info, warn};

use crate::graph::config::ConfigValue;
use crate::graph::error::{GraphError, ValidationError};
use crate::graph::{Graph, NodeId};
use crate::history::{CommandHistory, GraphCommand};
use crate::input::{DragOutcome, Selection};
use crate::persistence::{WorkflowStore, WorkflowStoreError};
use crate::prefs::EditorPreferences;
use crate::registries::atomic::node_type::{NodeType, NodeTypeRegistry};
use crate::render::CanvasRenderer;
use crate::render::inspector::{InspectorView, PropertyInspector};
use crate::render::svg::{SvgOptions, scene_to_svg};
use crate::services::persistence::types::WorkflowDocument;
use crate::services::runner::{RunError, RunReceipt, RunRequest, WorkflowRunner};
use flow_canvas::CanvasScene;

const DEFAULT_WORKFLOW_NAME: &str = "untitled";

/// A user action against the editor, applied in order by `apply_intents`.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphIntent {
    AddNode {
        node_type: NodeType,
        position: Point2D<f32>,
        label: Option<String>,
    },
    RemoveNode {
        id: NodeId,
    },
    RemoveSelectedNode,
    MoveNode {
        id: NodeId,
        position: Point2D<f32>,
    },
    Connect {
        from: NodeId,
        to: NodeId,
    },
    Disconnect {
        from: NodeId,
        to: NodeId,
    },
    SetNodeConfig {
        id: NodeId,
        field: String,
        value: ConfigValue,
    },
    /// Raw text typed into an inspector field.
    EditField {
        id: NodeId,
        field: String,
        input: String,
    },
    SetNodeLabel {
        id: NodeId,
        label: String,
    },
    SelectNode {
        id: NodeId,
    },
    ClearSelection,
    CloseInspector,
    PointerDown {
        position: Point2D<f32>,
    },
    PointerMove {
        position: Point2D<f32>,
    },
    PointerUp {
        position: Point2D<f32>,
    },
    Hover {
        position: Option<Point2D<f32>>,
    },
    Pan {
        delta: Vector2D<f32>,
    },
    Zoom {
        anchor: Point2D<f32>,
        zoom: f32,
    },
    Undo,
    Redo,
}

/// Main application state.
pub struct WorkflowEditorApp {
    graph: Graph,
    selection: Selection,
    history: CommandHistory,
    inspector: PropertyInspector,
    renderer: CanvasRenderer,
    svg_options: SvgOptions,
    name: String,
    /// Whether the graph changed since it was last loaded or saved.
    dirty: bool,
}

impl Default for WorkflowEditorApp {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowEditorApp {
    pub fn new() -> Self {
        Self::with_preferences(&EditorPreferences::default())
    }

    pub fn with_preferences(prefs: &EditorPreferences) -> Self {
        Self {
            graph: Graph::new(),
            selection: Selection::new(),
            history: CommandHistory::with_limit(prefs.history_limit),
            inspector: PropertyInspector::new(),
            renderer: CanvasRenderer::new(prefs.canvas.geometry()),
            svg_options: SvgOptions {
                grid_spacing: prefs.canvas.grid_spacing,
            },
            name: DEFAULT_WORKFLOW_NAME.to_string(),
            dirty: false,
        }
    }

    /// Start editing an existing graph with empty history.
    pub fn from_graph(name: &str, graph: Graph) -> Self {
        let mut app = Self::new();
        app.graph = graph;
        app.set_name(name);
        app
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn inspector(&self) -> &PropertyInspector {
        &self.inspector
    }

    pub fn renderer(&self) -> &CanvasRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut CanvasRenderer {
        &mut self.renderer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the workflow. Blank names fall back to the default.
    pub fn set_name(&mut self, name: &str) {
        let name = name.trim();
        self.name = if name.is_empty() {
            DEFAULT_WORKFLOW_NAME.to_string()
        } else {
            name.to_string()
        };
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // --- Graph mutations ---

    /// Add a node and record it in history.
    pub fn add_node(
        &mut self,
        node_type: NodeType,
        position: Point2D<f32>,
        label: Option<&str>,
    ) -> NodeId {
        let id = self.graph.add_node(node_type, position, label);
        let command = self
            .graph
            .get_node(id)
            .cloned()
            .zip(self.graph.node_index(id))
            .map(|(node, index)| GraphCommand::AddNode { node, index });
        if let Some(command) = command {
            self.record(command);
        }
        debug!("Added {node_type} node {id}");
        id
    }

    /// Add a node by type tag. Legacy tags are accepted.
    pub fn add_node_from_tag(
        &mut self,
        tag: &str,
        position: Point2D<f32>,
        label: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node_type = NodeTypeRegistry::global().resolve(tag)?;
        Ok(self.add_node(node_type, position, label))
    }

    /// Remove a node with its edges. Selection, hover and inspector state that
    /// referred to it are dropped.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.settle_drag();
        let removed = self.graph.remove_node(id)?;
        debug!("Removed node {id} with {} edges", removed.edges.len());
        self.record(GraphCommand::RemoveNode { removed });
        self.forget_node(id);
        Ok(())
    }

    /// Remove the selected node, if any. Returns whether a node was removed.
    pub fn delete_selected(&mut self) -> bool {
        self.settle_drag();
        let Some(id) = self.selection.selected() else {
            return false;
        };
        match self.remove_node(id) {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not delete selected node: {e}");
                self.forget_node(id);
                false
            },
        }
    }

    /// Move a node in one committed step.
    pub fn move_node(&mut self, id: NodeId, position: Point2D<f32>) -> Result<(), GraphError> {
        self.settle_drag();
        let from = self.graph.move_node(id, position)?;
        let to = self
            .graph
            .get_node(id)
            .map(|node| node.position())
            .unwrap_or(position);
        if from != to {
            self.record(GraphCommand::MoveNode { id, from, to });
        }
        Ok(())
    }

    /// Connect `from` to `to`. Returns `false` when the edge already existed.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<bool, GraphError> {
        let added = self.graph.add_edge(from, to)?;
        if added {
            self.record(GraphCommand::AddEdge { from, to });
        }
        Ok(added)
    }

    /// Remove the edge `from -> to`. Returns whether one was removed.
    pub fn disconnect(&mut self, from: NodeId, to: NodeId) -> bool {
        let removed = self.graph.remove_edge(from, to);
        if removed {
            self.record(GraphCommand::RemoveEdge { from, to });
        }
        removed
    }

    /// Validate and store a typed config value.
    ///
    /// A rejected value leaves the node untouched; when the node is selected
    /// the error is also shown inline in the inspector.
    pub fn set_node_config(
        &mut self,
        id: NodeId,
        field: &str,
        value: ConfigValue,
    ) -> Result<(), GraphError> {
        let input = value.to_string();
        match self.graph.set_node_config(id, field, value.clone()) {
            Ok(before) => {
                self.clear_field_error(id, field);
                if before.as_ref() != Some(&value) {
                    self.record(GraphCommand::EditConfig {
                        id,
                        field: field.to_string(),
                        before,
                        after: value,
                    });
                }
                Ok(())
            },
            Err(GraphError::Validation(error)) => {
                self.reject_field(id, &input, &error);
                Err(GraphError::Validation(error))
            },
            Err(e) => Err(e),
        }
    }

    /// Parse raw inspector text for `field` and store it.
    pub fn edit_field(&mut self, id: NodeId, field: &str, input: &str) -> Result<(), GraphError> {
        let node = self.graph.get_node(id).ok_or(GraphError::NotFound(id))?;
        let schema = node.schema();
        let parsed = match schema.field(field) {
            Some(property) => property.parse_input(input),
            None => Err(ValidationError::new(field, format!("not a field of {}", schema.tag))),
        };
        match parsed {
            Ok(value) => {
                // Keep what the user typed when the parsed value is refused.
                let result = self.set_node_config(id, field, value);
                if let Err(GraphError::Validation(error)) = &result {
                    self.reject_field(id, input, error);
                }
                result
            },
            Err(error) => {
                self.reject_field(id, input, &error);
                Err(GraphError::Validation(error))
            },
        }
    }

    pub fn set_node_label(&mut self, id: NodeId, label: &str) -> Result<(), GraphError> {
        let before = self.graph.set_node_label(id, label)?;
        let after = self
            .graph
            .get_node(id)
            .map(|node| node.label().to_string())
            .unwrap_or_default();
        if before != after {
            self.record(GraphCommand::RenameNode { id, before, after });
        }
        Ok(())
    }

    // --- Selection ---

    /// Select a node and open the inspector on it. Unknown ids are ignored.
    pub fn select_node(&mut self, id: NodeId) -> bool {
        if !self.graph.contains_node(id) {
            warn!("Ignoring selection of unknown node {id}");
            return false;
        }
        self.settle_drag();
        let changed = self.selection.select(id);
        self.sync_inspector();
        changed
    }

    pub fn clear_selection(&mut self) {
        self.settle_drag();
        self.selection.clear();
        self.sync_inspector();
    }

    /// Close the inspector. This also deselects the node.
    pub fn close_inspector(&mut self) {
        self.settle_drag();
        self.selection.close_inspector();
        self.sync_inspector();
    }

    // --- Pointer interaction (screen coordinates) ---
    //
    // Positions are projected through the viewport before they reach the
    // interaction state, which works in canvas units.

    /// Press on the canvas. Pressing a node selects it and starts a drag;
    /// pressing empty canvas clears the selection.
    pub fn pointer_down(&mut self, screen: Point2D<f32>) {
        self.settle_drag();
        let position = self.renderer.viewport().screen_to_canvas(screen);
        let hit = self
            .renderer
            .hit_test(&self.graph, position)
            .and_then(|id| self.graph.get_node(id).map(|node| (id, node.position())));
        if let Some(abandoned) = self.selection.pointer_down(hit, position) {
            self.commit_drag(abandoned);
        }
        self.sync_inspector();
    }

    /// Pointer motion. A node being dragged follows the pointer live; the
    /// intermediate positions are not recorded.
    pub fn pointer_move(&mut self, screen: Point2D<f32>) {
        let position = self.renderer.viewport().screen_to_canvas(screen);
        if let Some((id, origin)) = self.selection.pointer_move(position)
            && let Err(e) = self.graph.move_node(id, origin)
        {
            warn!("Dragged node vanished: {e}");
            self.forget_node(id);
        }
    }

    /// Release. A drag that moved the node becomes one history entry.
    pub fn pointer_up(&mut self, screen: Point2D<f32>) {
        let position = self.renderer.viewport().screen_to_canvas(screen);
        if let Some(outcome) = self.selection.pointer_up(position) {
            self.commit_drag(outcome);
        }
        self.sync_inspector();
    }

    /// Update the hovered node. Returns whether it changed.
    pub fn hover(&mut self, screen: Option<Point2D<f32>>) -> bool {
        let position = screen.map(|screen| self.renderer.viewport().screen_to_canvas(screen));
        self.renderer.set_hover(&self.graph, position)
    }

    /// Scroll the view. Node positions are unaffected.
    pub fn pan_by(&mut self, delta: Vector2D<f32>) {
        self.renderer.viewport_mut().pan_by(delta);
    }

    /// Zoom about a screen point; the zoom is clamped to the allowed range.
    pub fn zoom_about(&mut self, screen_anchor: Point2D<f32>, zoom: f32) {
        self.renderer.viewport_mut().zoom_about(screen_anchor, zoom);
    }

    // --- History ---

    /// Undo the most recent change. Ignored mid-drag.
    pub fn undo(&mut self) -> bool {
        if self.selection.is_dragging() {
            debug!("Undo ignored during drag");
            return false;
        }
        let undone = self.history.undo(&mut self.graph);
        if let Some(label) = undone {
            debug!("Undid {label}");
            self.after_history_step();
        }
        undone.is_some()
    }

    /// Redo the most recently undone change. Ignored mid-drag.
    pub fn redo(&mut self) -> bool {
        if self.selection.is_dragging() {
            debug!("Redo ignored during drag");
            return false;
        }
        let redone = self.history.redo(&mut self.graph);
        if let Some(label) = redone {
            debug!("Redid {label}");
            self.after_history_step();
        }
        redone.is_some()
    }

    // --- Intents ---

    /// Apply a batch of intents deterministically in insertion order.
    ///
    /// A failing intent is logged and skipped; later intents still apply.
    pub fn apply_intents<I>(&mut self, intents: I)
    where
        I: IntoIterator<Item = GraphIntent>,
    {
        for intent in intents {
            if let Err(e) = self.apply_intent(intent) {
                if e.is_validation() {
                    debug!("Rejected edit: {e}");
                } else {
                    warn!("Intent failed: {e}");
                }
            }
        }
    }

    pub fn apply_intent(&mut self, intent: GraphIntent) -> Result<(), GraphError> {
        match intent {
            GraphIntent::AddNode {
                node_type,
                position,
                label,
            } => {
                self.add_node(node_type, position, label.as_deref());
            },
            GraphIntent::RemoveNode { id } => self.remove_node(id)?,
            GraphIntent::RemoveSelectedNode => {
                self.delete_selected();
            },
            GraphIntent::MoveNode { id, position } => self.move_node(id, position)?,
            GraphIntent::Connect { from, to } => {
                self.connect(from, to)?;
            },
            GraphIntent::Disconnect { from, to } => {
                self.disconnect(from, to);
            },
            GraphIntent::SetNodeConfig { id, field, value } => {
                self.set_node_config(id, &field, value)?
            },
            GraphIntent::EditField { id, field, input } => self.edit_field(id, &field, &input)?,
            GraphIntent::SetNodeLabel { id, label } => self.set_node_label(id, &label)?,
            GraphIntent::SelectNode { id } => {
                if !self.select_node(id) && !self.graph.contains_node(id) {
                    return Err(GraphError::NotFound(id));
                }
            },
            GraphIntent::ClearSelection => self.clear_selection(),
            GraphIntent::CloseInspector => self.close_inspector(),
            GraphIntent::PointerDown { position } => self.pointer_down(position),
            GraphIntent::PointerMove { position } => self.pointer_move(position),
            GraphIntent::PointerUp { position } => self.pointer_up(position),
            GraphIntent::Hover { position } => {
                self.hover(position);
            },
            GraphIntent::Pan { delta } => self.pan_by(delta),
            GraphIntent::Zoom { anchor, zoom } => self.zoom_about(anchor, zoom),
            GraphIntent::Undo => {
                self.undo();
            },
            GraphIntent::Redo => {
                self.redo();
            },
        }
        Ok(())
    }

    // --- Documents ---

    /// Replace the graph with one loaded from `document`.
    ///
    /// On failure nothing changes. On success history and selection are reset.
    pub fn load_document(&mut self, document: &WorkflowDocument) -> Result<(), GraphError> {
        let graph = Graph::from_document(document)?;
        info!(
            "Loaded workflow {:?}: {} nodes, {} edges",
            document.name,
            graph.node_count(),
            graph.edge_count()
        );
        self.graph = graph;
        self.history.clear();
        self.selection.clear();
        self.renderer.set_hover(&self.graph, None);
        self.sync_inspector();
        if !document.name.trim().is_empty() {
            self.set_name(&document.name);
        }
        self.dirty = false;
        Ok(())
    }

    pub fn document(&self) -> WorkflowDocument {
        self.graph.to_document(&self.name)
    }

    pub fn save(&mut self, store: &WorkflowStore) -> Result<PathBuf, WorkflowStoreError> {
        let path = store.save(&self.name, &self.graph)?;
        self.dirty = false;
        info!("Saved workflow {:?} to {}", self.name, path.display());
        Ok(path)
    }

    pub fn open(&mut self, store: &WorkflowStore, name: &str) -> Result<(), WorkflowStoreError> {
        let document = store.load_document(name)?;
        self.load_document(&document)
            .map_err(WorkflowStoreError::Document)?;
        self.set_name(name);
        Ok(())
    }

    /// Hand the current graph to an execution engine.
    pub fn run(&self, runner: &dyn WorkflowRunner) -> Result<RunReceipt, RunError> {
        runner.run(&RunRequest::from_graph(&self.name, &self.graph))
    }

    // --- Derived views ---

    pub fn scene(&self) -> CanvasScene<NodeId> {
        self.renderer.derive_scene(&self.graph, &self.selection)
    }

    pub fn inspector_view(&self) -> Option<InspectorView> {
        self.inspector.view(&self.graph, &self.selection)
    }

    pub fn render_svg(&self) -> Result<String, std::fmt::Error> {
        scene_to_svg(&self.scene(), &self.svg_options)
    }

    // --- Internals ---

    fn record(&mut self, command: GraphCommand) {
        self.history.push(command);
        self.dirty = true;
    }

    /// Commit a drag interrupted by a selection change or another edit, at
    /// the position the node was last shown.
    fn settle_drag(&mut self) {
        let Some(node) = self.selection.dragged_node() else {
            return;
        };
        match self.graph.get_node(node).map(|node| node.position()) {
            Some(shown_at) => {
                if let Some(outcome) = self.selection.interrupt_drag(shown_at) {
                    debug!("Committing interrupted drag of {node}");
                    self.commit_drag(outcome);
                }
            },
            None => self.forget_node(node),
        }
    }

    fn commit_drag(&mut self, outcome: DragOutcome) {
        let DragOutcome { node, from, to } = outcome;
        let to = match self.graph.move_node(node, to) {
            Ok(_) => self
                .graph
                .get_node(node)
                .map(|node| node.position())
                .unwrap_or(to),
            Err(e) => {
                warn!("Dropping drag of missing node: {e}");
                self.forget_node(node);
                return;
            },
        };
        if from != to {
            self.record(GraphCommand::MoveNode { id: node, from, to });
        }
    }

    fn after_history_step(&mut self) {
        self.dirty = true;
        if let Some(id) = self.selection.selected()
            && !self.graph.contains_node(id)
        {
            self.selection.forget(id);
        }
        if let Some(id) = self.renderer.hovered()
            && !self.graph.contains_node(id)
        {
            self.renderer.forget(id);
        }
        self.sync_inspector();
    }

    fn forget_node(&mut self, id: NodeId) {
        self.selection.forget(id);
        self.renderer.forget(id);
        self.sync_inspector();
    }

    fn sync_inspector(&mut self) {
        self.inspector.sync_selection(self.selection.selected());
    }

    fn reject_field(&mut self, id: NodeId, input: &str, error: &ValidationError) {
        if self.selection.selected() == Some(id) {
            self.inspector.record_error(input, error);
        }
    }

    fn clear_field_error(&mut self, id: NodeId, field: &str) {
        if self.selection.selected() == Some(id) {
            self.inspector.clear_error(field);
        }
    }
}
