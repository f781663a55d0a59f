/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use super::NodeId;

/// A config value rejected by its field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Errors from graph operations.
///
/// Every failing call leaves the graph exactly as it was before the call.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Referenced node id does not exist.
    NotFound(NodeId),
    /// Edge endpoints are the same node.
    SelfLoop(NodeId),
    /// Config value violates its field constraint.
    Validation(ValidationError),
    /// Node type tag is not in the registry.
    UnknownType(String),
    /// Persisted document is malformed.
    Deserialization(String),
}

impl GraphError {
    pub fn is_validation(&self) -> bool {
        matches!(self, GraphError::Validation(_))
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::NotFound(id) => write!(f, "Node not found: {id}"),
            GraphError::SelfLoop(id) => write!(f, "Edge would connect node {id} to itself"),
            GraphError::Validation(e) => write!(f, "Invalid value for {e}"),
            GraphError::UnknownType(tag) => write!(f, "Unknown node type: {tag:?}"),
            GraphError::Deserialization(e) => write!(f, "Malformed workflow document: {e}"),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for GraphError {
    fn from(e: ValidationError) -> Self {
        GraphError::Validation(e)
    }
}
