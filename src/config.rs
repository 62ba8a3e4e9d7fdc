//! Generator configuration: the inventory plus the action delimiters
//!
//! The JSON layout matches `gg.conf.json`:
//!
//! ```json
//! {
//!   "Inventory": { "KeyOne": "value for key one", "KeyTwo": 2 },
//!   "Delimiter": { "Left": "{{", "Right": "}}" }
//! }
//! ```
//!
//! The same structure is accepted as TOML when the file ends in `.toml`.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::template::DelimiterPair;
use crate::value::{Mapping, Value};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "gg.conf.json";

/// Errors that can occur when loading or parsing a config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to parse config TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Delimiter.{0} must not be empty")]
    EmptyDelimiter(&'static str),
}

/// Inventory and delimiters used for every template of a run
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenConfig {
    #[serde(default)]
    pub inventory: Mapping,
    #[serde(default)]
    pub delimiter: DelimiterPair,
}

impl GenConfig {
    /// Load config from a file, choosing the format by extension
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Load config from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: GenConfig = serde_json::from_str(content)?;
        parsed.validate()
    }

    /// Load config from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: GenConfig = toml::from_str(content)?;
        parsed.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.delimiter.left.is_empty() {
            return Err(ConfigError::EmptyDelimiter("Left"));
        }
        if self.delimiter.right.is_empty() {
            return Err(ConfigError::EmptyDelimiter("Right"));
        }
        Ok(self)
    }

    /// The inventory as a template root value
    pub fn inventory_value(&self) -> Value {
        Value::Mapping(self.inventory.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_JSON: &str = r#"{
  "Inventory": {
    "KeyOne": "value for key one",
    "KeyTwo": 2,
    "KeyBool": true,
    "Nested": {
      "KeyA": {
        "Key1": "KeyA-Key1 value"
      }
    }
  },
  "Delimiter": {
    "Left": "{{",
    "Right": "}}"
  }
}"#;

    #[test]
    fn test_parse_json_layout() {
        let config = GenConfig::from_json_str(SAMPLE_JSON).expect("Should parse");
        assert_eq!(config.delimiter, DelimiterPair::default());
        let keys: Vec<_> = config.inventory.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["KeyOne", "KeyTwo", "KeyBool", "Nested"]);
        assert_eq!(config.inventory["KeyTwo"], Value::Int(2));
        assert_eq!(
            config.inventory["Nested"].get("KeyA").and_then(|v| v.get("Key1")),
            Some(&Value::from("KeyA-Key1 value"))
        );
    }

    #[test]
    fn test_missing_delimiter_uses_default() {
        let config = GenConfig::from_json_str(r#"{"Inventory": {"A": 1}}"#).expect("Should parse");
        assert_eq!(config.delimiter, DelimiterPair::default());
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        let err = GenConfig::from_json_str(r#"{"Delimiter": {"Left": "", "Right": "}}"}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDelimiter("Left")));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[Inventory]
Region = "eu-west-1"
Replicas = 3

[Delimiter]
Left = "[["
Right = "]]"
"#;
        let config = GenConfig::from_toml_str(toml_str).expect("Should parse");
        assert_eq!(config.delimiter, DelimiterPair::new("[[", "]]"));
        assert_eq!(config.inventory["Replicas"], Value::Int(3));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            GenConfig::from_json_str("{not json"),
            Err(ConfigError::JsonError(_))
        ));
    }
}
