//! YAML rendering of value subtrees for the `yaml` template function

use crate::error::RenderError;
use crate::value::Value;

/// Serialize `value` as a YAML document, keeping mapping key order
pub fn to_yaml(value: &Value) -> Result<String, RenderError> {
    serde_yaml::to_string(value).map_err(|e| RenderError::Serialization(e.to_string()))
}
