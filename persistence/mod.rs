/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Workflow persistence as pretty-printed JSON documents.
//!
//! A `WorkflowStore` keeps one `<name>.json` file per named workflow in its
//! directory. Writes go to a temporary sibling first and are renamed into
//! place, so a crash never leaves a half-written document behind.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::graph::Graph;
use crate::graph::error::GraphError;
use crate::services::persistence::types::WorkflowDocument;

const DOCUMENT_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

/// Read and parse a workflow document from `path`.
pub fn read_document(path: &Path) -> Result<WorkflowDocument, WorkflowStoreError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| WorkflowStoreError::Io(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&json)
        .map_err(|e| WorkflowStoreError::Decode(format!("{}: {e}", path.display())))
}

/// Read `path` and rebuild the graph it describes.
pub fn read_graph(path: &Path) -> Result<(WorkflowDocument, Graph), WorkflowStoreError> {
    let document = read_document(path)?;
    let graph = Graph::from_document(&document).map_err(WorkflowStoreError::Document)?;
    Ok((document, graph))
}

/// Atomically write `document` to `path` (temp file + rename).
pub fn write_document(path: &Path, document: &WorkflowDocument) -> Result<(), WorkflowStoreError> {
    let json = document
        .to_json_pretty()
        .map_err(|e| WorkflowStoreError::Encode(format!("{e}")))?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| WorkflowStoreError::Io(format!("Failed to create dir: {e}")))?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(TEMP_SUFFIX);
    let temp_path = path.with_file_name(temp_name);

    std::fs::write(&temp_path, json.as_bytes()).map_err(|e| {
        WorkflowStoreError::Io(format!("Failed to write {}: {e}", temp_path.display()))
    })?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(WorkflowStoreError::Io(format!(
            "Failed to move document into place at {}: {e}",
            path.display()
        )));
    }
    debug!("Wrote workflow document to {}", path.display());
    Ok(())
}

/// Directory-backed store of named workflows.
pub struct WorkflowStore {
    dir: PathBuf,
}

impl WorkflowStore {
    fn validate_name(name: &str) -> Result<&str, WorkflowStoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(WorkflowStoreError::InvalidName(
                "Workflow name must not be empty".to_string(),
            ));
        }
        if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
            return Err(WorkflowStoreError::InvalidName(format!(
                "Workflow name {trimmed:?} must not contain path separators"
            )));
        }
        Ok(trimmed)
    }

    /// Open or create a store at the given directory.
    pub fn open(dir: PathBuf) -> Result<Self, WorkflowStoreError> {
        std::fs::create_dir_all(&dir)
            .map_err(|e| WorkflowStoreError::Io(format!("Failed to create dir: {e}")))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the named workflow.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, WorkflowStoreError> {
        let name = Self::validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{DOCUMENT_EXTENSION}")))
    }

    /// Save `graph` under `name`, replacing any previous version.
    pub fn save(&self, name: &str, graph: &Graph) -> Result<PathBuf, WorkflowStoreError> {
        let path = self.path_for(name)?;
        let document = graph.to_document(name.trim());
        write_document(&path, &document)?;
        Ok(path)
    }

    pub fn load_document(&self, name: &str) -> Result<WorkflowDocument, WorkflowStoreError> {
        read_document(&self.path_for(name)?)
    }

    pub fn load(&self, name: &str) -> Result<Graph, WorkflowStoreError> {
        read_graph(&self.path_for(name)?).map(|(_, graph)| graph)
    }

    /// Names of stored workflows in stable order.
    pub fn list_names(&self) -> Result<Vec<String>, WorkflowStoreError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| WorkflowStoreError::Io(format!("Failed to list {}: {e}", self.dir.display())))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {e}", self.dir.display());
                    continue;
                },
            };
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> Result<(), WorkflowStoreError> {
        let path = self.path_for(name)?;
        std::fs::remove_file(&path)
            .map_err(|e| WorkflowStoreError::Io(format!("Failed to delete {}: {e}", path.display())))
    }

    /// Default storage directory for workflow documents.
    pub fn default_data_dir() -> PathBuf {
        let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("flowshell");
        dir.push("workflows");
        dir
    }
}

/// Errors from the workflow store.
#[derive(Debug)]
pub enum WorkflowStoreError {
    Io(String),
    Encode(String),
    Decode(String),
    InvalidName(String),
    Document(GraphError),
}

impl std::fmt::Display for WorkflowStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStoreError::Io(e) => write!(f, "IO error: {e}"),
            WorkflowStoreError::Encode(e) => write!(f, "Encode error: {e}"),
            WorkflowStoreError::Decode(e) => write!(f, "Decode error: {e}"),
            WorkflowStoreError::InvalidName(e) => write!(f, "Invalid name: {e}"),
            WorkflowStoreError::Document(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for WorkflowStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkflowStoreError::Document(e) => Some(e),
            _ => None,
        }
    }
}
