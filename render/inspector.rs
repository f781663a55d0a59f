/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Property inspector.
//!
//! Builds a schema-driven form for the selected node. Field values are read
//! from the graph on every call; the inspector itself only remembers inline
//! errors for rejected edits, keyed by field, until the selection changes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::config::ConfigValue;
use crate::graph::error::ValidationError;
use crate::graph::{Graph, NodeId};
use crate::input::Selection;
use crate::registries::atomic::node_type::{FieldKind, NodeCategory, NodeType};

/// A rejected edit: what the user typed and why it was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub input: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Value currently stored on the node.
    pub value: ConfigValue,
    /// Text the input should show: the rejected input while an error is
    /// pending, otherwise the stored value.
    pub input: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorView {
    pub node: NodeId,
    pub node_type: NodeType,
    pub type_label: &'static str,
    pub icon: &'static str,
    pub category: NodeCategory,
    pub label: String,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyInspector {
    node: Option<NodeId>,
    errors: BTreeMap<String, FieldError>,
}

impl PropertyInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the current selection; pending errors belong to one node only.
    pub fn sync_selection(&mut self, selected: Option<NodeId>) {
        if self.node != selected {
            self.node = selected;
            self.errors.clear();
        }
    }

    pub fn record_error(&mut self, input: &str, error: &ValidationError) {
        self.errors.insert(
            error.field.clone(),
            FieldError {
                input: input.to_string(),
                message: error.message.clone(),
            },
        );
    }

    pub fn clear_error(&mut self, field: &str) {
        self.errors.remove(field);
    }

    pub fn field_error(&self, field: &str) -> Option<&FieldError> {
        self.errors.get(field)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Form for the selected node, or `None` while the inspector is closed.
    pub fn view(&self, graph: &Graph, selection: &Selection) -> Option<InspectorView> {
        let node = graph.get_node(selection.selected()?)?;
        let schema = node.schema();
        let errors = if self.node == Some(node.id()) {
            Some(&self.errors)
        } else {
            None
        };

        let fields = schema
            .fields
            .iter()
            .map(|field| {
                let value = node
                    .config_value(field.name)
                    .cloned()
                    .unwrap_or_else(|| field.default_value());
                let error = errors.and_then(|errors| errors.get(field.name));
                FieldView {
                    name: field.name,
                    label: field.label,
                    kind: field.kind,
                    input: error
                        .map(|error| error.input.clone())
                        .unwrap_or_else(|| value.to_string()),
                    error: error.map(|error| error.message.clone()),
                    value,
                }
            })
            .collect();

        Some(InspectorView {
            node: node.id(),
            node_type: node.node_type(),
            type_label: schema.display_label,
            icon: schema.icon,
            category: schema.category,
            label: node.label().to_string(),
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::default::Point2D;

    fn llm_graph() -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let id = graph.add_node(NodeType::LlmCall, Point2D::new(700.0, 150.0), None);
        (graph, id)
    }

    #[test]
    fn closed_inspector_has_no_view() {
        let (graph, _) = llm_graph();
        assert_eq!(PropertyInspector::new().view(&graph, &Selection::new()), None);
    }

    #[test]
    fn view_renders_one_input_per_schema_field() {
        let (graph, id) = llm_graph();
        let mut selection = Selection::new();
        selection.select(id);

        let view = PropertyInspector::new().view(&graph, &selection).unwrap();

        assert_eq!(view.label, "LLM");
        assert_eq!(view.icon, "🤖");
        let inputs: Vec<(&str, &str)> = view
            .fields
            .iter()
            .map(|field| (field.name, field.input.as_str()))
            .collect();
        assert_eq!(
            inputs,
            vec![("model", "GPT-4"), ("temperature", "0.7"), ("maxTokens", "2000")]
        );
        assert!(view.fields.iter().all(|field| field.error.is_none()));
    }

    #[test]
    fn rejected_input_is_shown_inline_until_selection_changes() {
        let (graph, id) = llm_graph();
        let mut selection = Selection::new();
        selection.select(id);
        let mut inspector = PropertyInspector::new();
        inspector.sync_selection(selection.selected());

        inspector.record_error("1.4", &ValidationError::new("temperature", "must be between 0 and 1"));
        let view = inspector.view(&graph, &selection).unwrap();
        let temperature = &view.fields[1];
        assert_eq!(temperature.input, "1.4");
        assert_eq!(temperature.value, ConfigValue::Number(0.7));
        assert_eq!(temperature.error.as_deref(), Some("must be between 0 and 1"));

        inspector.sync_selection(None);
        assert!(!inspector.has_errors());
    }

    #[test]
    fn view_of_removed_node_is_none() {
        let (mut graph, id) = llm_graph();
        let mut selection = Selection::new();
        selection.select(id);
        graph.remove_node(id).unwrap();

        assert_eq!(PropertyInspector::new().view(&graph, &selection), None);
    }
}
