/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single node config value.
///
/// Persisted untagged: numbers as JSON numbers, everything else as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(f64),
    Text(String),
}

impl ConfigValue {
    pub fn text(value: impl Into<String>) -> Self {
        ConfigValue::Text(value.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            ConfigValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            ConfigValue::Number(_) => None,
        }
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Number(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Number(n) => write!(f, "{n}"),
            ConfigValue::Text(s) => f.write_str(s),
        }
    }
}

/// Field name to value. Ordered so serialized documents are stable.
pub type NodeConfig = BTreeMap<String, ConfigValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_display_without_trailing_zero() {
        assert_eq!(ConfigValue::Number(2000.0).to_string(), "2000");
        assert_eq!(ConfigValue::Number(0.7).to_string(), "0.7");
        assert_eq!(ConfigValue::text("GPT-4").to_string(), "GPT-4");
    }

    #[test]
    fn untagged_json_shape() {
        let mut config = NodeConfig::new();
        config.insert("model".to_string(), ConfigValue::text("GPT-4"));
        config.insert("maxTokens".to_string(), ConfigValue::Number(2000.0));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["model"], "GPT-4");
        assert_eq!(json["maxTokens"], 2000.0);

        let parsed: NodeConfig =
            serde_json::from_str(r#"{"maxTokens": 2000, "model": "GPT-4"}"#).unwrap();
        assert_eq!(parsed, config);
    }
}
