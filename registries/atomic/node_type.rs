/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Node type catalog.
//!
//! Every node type is a closed variant of [`NodeType`] with one static
//! [`NodeTypeSchema`]. Rendering, inspector fields, config defaults and
//! validation are all driven by a lookup here; nothing else compares type
//! tags as strings.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::graph::config::{ConfigValue, NodeConfig};
use crate::graph::error::{GraphError, ValidationError};

pub const NODE_TYPE_ID_START: &str = "start";
pub const NODE_TYPE_ID_VECTOR_SEARCH: &str = "vector-search";
pub const NODE_TYPE_ID_ROUTER: &str = "router";
pub const NODE_TYPE_ID_LLM_CALL: &str = "llm-call";
pub const NODE_TYPE_ID_TOOL_CALL: &str = "tool-call";
pub const NODE_TYPE_ID_END: &str = "end";

/// Tags written by older documents, mapped to their canonical type.
const NODE_TYPE_LEGACY_ALIASES: &[(&str, NodeType)] = &[
    ("ingest", NodeType::Start),
    ("response", NodeType::End),
    ("process", NodeType::VectorSearch),
    ("llm", NodeType::LlmCall),
    ("tool", NodeType::ToolCall),
];

pub const LLM_MODELS: &[&str] = &["GPT-4", "Gemini 1.5 Pro", "Claude 3 Opus"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    Start,
    VectorSearch,
    Router,
    LlmCall,
    ToolCall,
    End,
}

impl NodeType {
    /// Palette order.
    pub const ALL: [NodeType; 6] = [
        NodeType::Start,
        NodeType::VectorSearch,
        NodeType::Router,
        NodeType::LlmCall,
        NodeType::ToolCall,
        NodeType::End,
    ];

    pub fn tag(self) -> &'static str {
        self.schema().tag
    }

    pub fn schema(self) -> &'static NodeTypeSchema {
        match self {
            NodeType::Start => &START_SCHEMA,
            NodeType::VectorSearch => &VECTOR_SEARCH_SCHEMA,
            NodeType::Router => &ROUTER_SCHEMA,
            NodeType::LlmCall => &LLM_CALL_SCHEMA,
            NodeType::ToolCall => &TOOL_CALL_SCHEMA,
            NodeType::End => &END_SCHEMA,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Source,
    Transform,
    Control,
    Sink,
}

impl NodeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeCategory::Source => "source",
            NodeCategory::Transform => "transform",
            NodeCategory::Control => "control",
            NodeCategory::Sink => "sink",
        }
    }
}

/// Input kind of a property field, with its constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldKind {
    Text {
        max_len: Option<usize>,
    },
    Select {
        options: &'static [&'static str],
    },
    /// `step` is a presentation hint for inspector widgets and is not enforced.
    NumberRange {
        min: f64,
        max: Option<f64>,
        step: Option<f64>,
        integer: bool,
    },
    MultilineText,
}

impl FieldKind {
    /// Check a value against this kind's constraint.
    pub fn check(&self, value: &ConfigValue) -> Result<(), String> {
        match (self, value) {
            (FieldKind::Text { max_len }, ConfigValue::Text(text)) => match max_len {
                Some(max) if text.chars().count() > *max => {
                    Err(format!("must be at most {max} characters"))
                },
                _ => Ok(()),
            },
            (FieldKind::MultilineText, ConfigValue::Text(_)) => Ok(()),
            (FieldKind::Select { options }, ConfigValue::Text(choice)) => {
                if options.contains(&choice.as_str()) {
                    Ok(())
                } else {
                    Err(format!("must be one of: {}", options.join(", ")))
                }
            },
            (
                FieldKind::NumberRange {
                    min, max, integer, ..
                },
                ConfigValue::Number(n),
            ) => {
                if !n.is_finite() {
                    return Err("must be a finite number".to_string());
                }
                if *integer && n.fract() != 0.0 {
                    return Err("must be a whole number".to_string());
                }
                match max {
                    Some(max) if *n < *min || *n > *max => {
                        Err(format!("must be between {min} and {max}"))
                    },
                    None if *n < *min => Err(format!("must be at least {min}")),
                    _ => Ok(()),
                }
            },
            (FieldKind::NumberRange { .. }, ConfigValue::Text(_)) => {
                Err("must be a number".to_string())
            },
            (_, ConfigValue::Number(_)) => Err("must be text".to_string()),
        }
    }

    /// Parse raw inspector input into a value of this kind and check it.
    pub fn parse_input(&self, raw: &str) -> Result<ConfigValue, String> {
        let value = match self {
            FieldKind::NumberRange { .. } => raw
                .trim()
                .parse::<f64>()
                .map(ConfigValue::Number)
                .map_err(|_| "must be a number".to_string())?,
            FieldKind::Select { .. } => ConfigValue::text(raw.trim()),
            FieldKind::Text { .. } | FieldKind::MultilineText => ConfigValue::text(raw),
        };
        self.check(&value)?;
        Ok(value)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Select { .. } => "select",
            FieldKind::NumberRange { .. } => "numberRange",
            FieldKind::MultilineText => "multilineText",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldDefault {
    Number(f64),
    Text(&'static str),
}

impl FieldDefault {
    pub fn to_value(self) -> ConfigValue {
        match self {
            FieldDefault::Number(n) => ConfigValue::Number(n),
            FieldDefault::Text(s) => ConfigValue::text(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
}

impl PropertyField {
    pub fn default_value(&self) -> ConfigValue {
        self.default.to_value()
    }

    pub fn validate(&self, value: &ConfigValue) -> Result<(), ValidationError> {
        self.kind
            .check(value)
            .map_err(|message| ValidationError::new(self.name, message))
    }

    pub fn parse_input(&self, raw: &str) -> Result<ConfigValue, ValidationError> {
        self.kind
            .parse_input(raw)
            .map_err(|message| ValidationError::new(self.name, message))
    }
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeSchema {
    pub node_type: NodeType,
    pub tag: &'static str,
    pub display_label: &'static str,
    pub icon: &'static str,
    pub category: NodeCategory,
    pub fields: &'static [PropertyField],
}

impl NodeTypeSchema {
    pub fn field(&self, name: &str) -> Option<&'static PropertyField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Config seeded from every field's default.
    pub fn default_config(&self) -> NodeConfig {
        self.fields
            .iter()
            .map(|field| (field.name.to_string(), field.default_value()))
            .collect()
    }

    /// Validate one field value, rejecting names the schema does not declare.
    pub fn validate_field(&self, name: &str, value: &ConfigValue) -> Result<(), ValidationError> {
        let field = self
            .field(name)
            .ok_or_else(|| ValidationError::new(name, format!("not a field of {}", self.tag)))?;
        field.validate(value)
    }
}

static START_SCHEMA: NodeTypeSchema = NodeTypeSchema {
    node_type: NodeType::Start,
    tag: NODE_TYPE_ID_START,
    display_label: "Start",
    icon: "📄",
    category: NodeCategory::Source,
    fields: &[PropertyField {
        name: "source",
        label: "Source",
        kind: FieldKind::Select {
            options: &["pdf", "url", "text"],
        },
        default: FieldDefault::Text("pdf"),
    }],
};

static VECTOR_SEARCH_SCHEMA: NodeTypeSchema = NodeTypeSchema {
    node_type: NodeType::VectorSearch,
    tag: NODE_TYPE_ID_VECTOR_SEARCH,
    display_label: "Vector Search",
    icon: "🔍",
    category: NodeCategory::Transform,
    fields: &[
        PropertyField {
            name: "collection",
            label: "Collection",
            kind: FieldKind::Text { max_len: Some(128) },
            default: FieldDefault::Text(""),
        },
        PropertyField {
            name: "topK",
            label: "Top K",
            kind: FieldKind::NumberRange {
                min: 1.0,
                max: Some(100.0),
                step: Some(1.0),
                integer: true,
            },
            default: FieldDefault::Number(5.0),
        },
    ],
};

static ROUTER_SCHEMA: NodeTypeSchema = NodeTypeSchema {
    node_type: NodeType::Router,
    tag: NODE_TYPE_ID_ROUTER,
    display_label: "Router",
    icon: "🔀",
    category: NodeCategory::Control,
    fields: &[PropertyField {
        name: "routingExpression",
        label: "Routing Logic",
        kind: FieldKind::MultilineText,
        default: FieldDefault::Text(""),
    }],
};

static LLM_CALL_SCHEMA: NodeTypeSchema = NodeTypeSchema {
    node_type: NodeType::LlmCall,
    tag: NODE_TYPE_ID_LLM_CALL,
    display_label: "LLM",
    icon: "🤖",
    category: NodeCategory::Transform,
    fields: &[
        PropertyField {
            name: "model",
            label: "Model",
            kind: FieldKind::Select {
                options: LLM_MODELS,
            },
            default: FieldDefault::Text("GPT-4"),
        },
        PropertyField {
            name: "temperature",
            label: "Temperature",
            kind: FieldKind::NumberRange {
                min: 0.0,
                max: Some(1.0),
                step: Some(0.1),
                integer: false,
            },
            default: FieldDefault::Number(0.7),
        },
        PropertyField {
            name: "maxTokens",
            label: "Max Tokens",
            kind: FieldKind::NumberRange {
                min: 1.0,
                max: None,
                step: Some(1.0),
                integer: true,
            },
            default: FieldDefault::Number(2000.0),
        },
    ],
};

static TOOL_CALL_SCHEMA: NodeTypeSchema = NodeTypeSchema {
    node_type: NodeType::ToolCall,
    tag: NODE_TYPE_ID_TOOL_CALL,
    display_label: "Tool",
    icon: "🔧",
    category: NodeCategory::Transform,
    fields: &[
        PropertyField {
            name: "toolName",
            label: "Tool Name",
            kind: FieldKind::Text { max_len: None },
            default: FieldDefault::Text(""),
        },
        PropertyField {
            name: "arguments",
            label: "Arguments",
            kind: FieldKind::MultilineText,
            default: FieldDefault::Text(""),
        },
    ],
};

static END_SCHEMA: NodeTypeSchema = NodeTypeSchema {
    node_type: NodeType::End,
    tag: NODE_TYPE_ID_END,
    display_label: "End",
    icon: "✅",
    category: NodeCategory::Sink,
    fields: &[PropertyField {
        name: "format",
        label: "Output Format",
        kind: FieldKind::Select {
            options: &["text", "markdown", "json"],
        },
        default: FieldDefault::Text("text"),
    }],
};

/// Tag lookup over the fixed catalog. Populated once, read-only afterwards.
pub struct NodeTypeRegistry {
    tags: HashMap<String, NodeType>,
    palette: Vec<NodeType>,
}

impl NodeTypeRegistry {
    pub(crate) fn register(&mut self, tag: &str, node_type: NodeType) {
        self.tags.insert(tag.to_ascii_lowercase(), node_type);
    }

    pub(crate) fn register_core_seed_defaults(&mut self) {
        for node_type in NodeType::ALL {
            self.register(node_type.tag(), node_type);
            self.palette.push(node_type);
        }
        for (alias, node_type) in NODE_TYPE_LEGACY_ALIASES {
            self.register(alias, *node_type);
        }
    }

    /// Shared registry for the process.
    pub fn global() -> &'static NodeTypeRegistry {
        static REGISTRY: OnceLock<NodeTypeRegistry> = OnceLock::new();
        REGISTRY.get_or_init(NodeTypeRegistry::default)
    }

    /// Resolve a canonical or legacy tag.
    pub fn resolve(&self, tag: &str) -> Result<NodeType, GraphError> {
        let requested = tag.trim().to_ascii_lowercase();
        self.tags
            .get(&requested)
            .copied()
            .ok_or_else(|| GraphError::UnknownType(tag.to_string()))
    }

    pub fn schema_for(&self, node_type: NodeType) -> &'static NodeTypeSchema {
        node_type.schema()
    }

    pub fn schema_for_tag(&self, tag: &str) -> Result<&'static NodeTypeSchema, GraphError> {
        self.resolve(tag).map(NodeType::schema)
    }

    /// Ordered catalog for palette surfaces.
    pub fn palette(&self) -> impl Iterator<Item = &'static NodeTypeSchema> + '_ {
        self.palette.iter().map(|node_type| node_type.schema())
    }
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            tags: HashMap::new(),
            palette: Vec::new(),
        };
        registry.register_core_seed_defaults();
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("start", NodeType::Start)]
    #[case("vector-search", NodeType::VectorSearch)]
    #[case("router", NodeType::Router)]
    #[case("llm-call", NodeType::LlmCall)]
    #[case("tool-call", NodeType::ToolCall)]
    #[case("end", NodeType::End)]
    #[case("ingest", NodeType::Start)]
    #[case("response", NodeType::End)]
    #[case("process", NodeType::VectorSearch)]
    #[case("llm", NodeType::LlmCall)]
    #[case(" LLM-Call ", NodeType::LlmCall)]
    fn registry_resolves_canonical_and_legacy_tags(#[case] tag: &str, #[case] expected: NodeType) {
        let registry = NodeTypeRegistry::default();
        assert_eq!(registry.resolve(tag).unwrap(), expected);
    }

    #[test]
    fn registry_rejects_unknown_tag() {
        let registry = NodeTypeRegistry::default();
        assert_eq!(
            registry.schema_for_tag("webhook"),
            Err(GraphError::UnknownType("webhook".to_string()))
        );
    }

    #[test]
    fn palette_lists_canonical_types_once_in_order() {
        let tags: Vec<&str> = NodeTypeRegistry::global()
            .palette()
            .map(|schema| schema.tag)
            .collect();
        assert_eq!(
            tags,
            vec!["start", "vector-search", "router", "llm-call", "tool-call", "end"]
        );
    }

    #[test]
    fn every_schema_default_passes_its_own_validation() {
        for node_type in NodeType::ALL {
            let schema = node_type.schema();
            assert_eq!(schema.node_type, node_type);
            for field in schema.fields {
                assert_eq!(field.validate(&field.default_value()), Ok(()), "{}", field.name);
            }
        }
    }

    #[test]
    fn llm_call_exposes_model_temperature_and_max_tokens() {
        let schema = NodeType::LlmCall.schema();
        let names: Vec<&str> = schema.fields.iter().map(|field| field.name).collect();
        assert_eq!(names, vec!["model", "temperature", "maxTokens"]);

        let config = schema.default_config();
        assert_eq!(config["model"], ConfigValue::text("GPT-4"));
        assert_eq!(config["temperature"], ConfigValue::Number(0.7));
        assert_eq!(config["maxTokens"], ConfigValue::Number(2000.0));
    }

    #[test]
    fn router_exposes_free_form_routing_expression() {
        let field = NodeType::Router.schema().field("routingExpression").unwrap();
        assert_eq!(field.kind, FieldKind::MultilineText);
        assert!(field.validate(&ConfigValue::text("if score > 0.5\n  -> llm")).is_ok());
    }

    #[rstest]
    #[case("temperature", ConfigValue::Number(0.0), true)]
    #[case("temperature", ConfigValue::Number(1.0), true)]
    #[case("temperature", ConfigValue::Number(0.55), true)]
    #[case("temperature", ConfigValue::Number(1.4), false)]
    #[case("temperature", ConfigValue::Number(-0.1), false)]
    #[case("temperature", ConfigValue::Number(f64::NAN), false)]
    #[case("temperature", ConfigValue::text("0.5"), false)]
    #[case("maxTokens", ConfigValue::Number(1.0), true)]
    #[case("maxTokens", ConfigValue::Number(0.0), false)]
    #[case("maxTokens", ConfigValue::Number(12.5), false)]
    #[case("maxTokens", ConfigValue::Number(f64::INFINITY), false)]
    #[case("model", ConfigValue::text("Claude 3 Opus"), true)]
    #[case("model", ConfigValue::text("gpt-4"), false)]
    #[case("model", ConfigValue::Number(4.0), false)]
    fn llm_call_field_validation(
        #[case] field: &str,
        #[case] value: ConfigValue,
        #[case] accepted: bool,
    ) {
        let result = NodeType::LlmCall.schema().validate_field(field, &value);
        assert_eq!(result.is_ok(), accepted, "{field} = {value:?}: {result:?}");
    }

    #[test]
    fn validation_error_names_the_field() {
        let err = NodeType::LlmCall
            .schema()
            .validate_field("temperature", &ConfigValue::Number(1.4))
            .unwrap_err();
        assert_eq!(err.field, "temperature");
        assert_eq!(err.message, "must be between 0 and 1");
    }

    #[test]
    fn unknown_field_is_a_validation_error() {
        let err = NodeType::End
            .schema()
            .validate_field("temperature", &ConfigValue::Number(0.5))
            .unwrap_err();
        assert_eq!(err.field, "temperature");
    }

    #[test]
    fn text_max_length_counts_characters() {
        let field = NodeType::VectorSearch.schema().field("collection").unwrap();
        assert!(field.validate(&ConfigValue::text("é".repeat(128))).is_ok());
        assert!(field.validate(&ConfigValue::text("a".repeat(129))).is_err());
    }

    #[rstest]
    #[case("temperature", " 0.3 ", Ok(ConfigValue::Number(0.3)))]
    #[case("maxTokens", "4096", Ok(ConfigValue::Number(4096.0)))]
    #[case("model", "Gemini 1.5 Pro", Ok(ConfigValue::text("Gemini 1.5 Pro")))]
    fn parse_input_accepts_well_formed_values(
        #[case] field: &str,
        #[case] raw: &str,
        #[case] expected: Result<ConfigValue, ValidationError>,
    ) {
        let field = NodeType::LlmCall.schema().field(field).unwrap();
        assert_eq!(field.parse_input(raw), expected);
    }

    #[test]
    fn parse_input_rejects_non_numeric_text_for_number_fields() {
        let field = NodeType::LlmCall.schema().field("maxTokens").unwrap();
        let err = field.parse_input("lots").unwrap_err();
        assert_eq!(err.message, "must be a number");
    }
}
