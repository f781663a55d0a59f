/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Editor preferences, read from `<config_dir>/flowshell/prefs.toml`.
//!
//! Every field is optional; a missing file yields the defaults.

use std::path::{Path, PathBuf};

use flow_canvas::CanvasGeometry;
use serde::{Deserialize, Serialize};

use crate::history::MAX_UNDO_STEPS;
use crate::persistence::WorkflowStore;

const PREFS_FILE_NAME: &str = "prefs.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanvasPrefs {
    #[serde(default = "default_node_width")]
    pub node_width: f32,
    #[serde(default = "default_node_height")]
    pub node_height: f32,
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f32,
}

fn default_node_width() -> f32 {
    160.0
}

fn default_node_height() -> f32 {
    80.0
}

fn default_grid_spacing() -> f32 {
    20.0
}

fn default_history_limit() -> usize {
    MAX_UNDO_STEPS
}

impl Default for CanvasPrefs {
    fn default() -> Self {
        Self {
            node_width: default_node_width(),
            node_height: default_node_height(),
            grid_spacing: default_grid_spacing(),
        }
    }
}

impl CanvasPrefs {
    pub fn geometry(&self) -> CanvasGeometry {
        CanvasGeometry::with_node_size(self.node_width, self.node_height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditorPreferences {
    /// Undo entries kept before the oldest are dropped.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub canvas: CanvasPrefs,
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            data_dir: None,
            canvas: CanvasPrefs::default(),
            log_filter: None,
        }
    }
}

impl EditorPreferences {
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("flowshell");
        path.push(PREFS_FILE_NAME);
        Some(path)
    }

    pub fn from_toml(text: &str) -> Result<Self, PrefsError> {
        let prefs: Self = toml::from_str(text).map_err(|e| PrefsError::Parse(e.to_string()))?;
        prefs.validate()?;
        Ok(prefs)
    }

    /// Load from `path`. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No preferences at {}; using defaults", path.display());
                Ok(Self::default())
            },
            Err(e) => Err(PrefsError::Io(format!("Failed to read {}: {e}", path.display()))),
        }
    }

    /// Load from the default location, or defaults when there is none.
    pub fn load_default() -> Result<Self, PrefsError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(WorkflowStore::default_data_dir)
    }

    fn validate(&self) -> Result<(), PrefsError> {
        if self.history_limit == 0 {
            return Err(PrefsError::Invalid("history_limit must be at least 1".to_string()));
        }
        let canvas = &self.canvas;
        for (name, value) in [
            ("canvas.node_width", canvas.node_width),
            ("canvas.node_height", canvas.node_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PrefsError::Invalid(format!("{name} must be a positive number")));
            }
        }
        if !canvas.grid_spacing.is_finite() || canvas.grid_spacing < 0.0 {
            return Err(PrefsError::Invalid(
                "canvas.grid_spacing must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrefsError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for PrefsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefsError::Io(e) => write!(f, "IO error: {e}"),
            PrefsError::Parse(e) => write!(f, "Invalid preferences file: {e}"),
            PrefsError::Invalid(e) => write!(f, "Invalid preference: {e}"),
        }
    }
}

impl std::error::Error for PrefsError {}
