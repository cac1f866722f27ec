//! YAML parsing and serialization for `YamlNode` trees.
//!
//! `serde_yaml` does the actual reading and writing; this module converts
//! between its `Value` type and our node model, keeping mapping order intact
//! in both directions.
//!
//! # Example
//!
//! ```
//! use yamlreplace::document::parser::{parse_yaml, serialize_yaml};
//!
//! let node = parse_yaml("a:\n  b: value\n").unwrap();
//! assert_eq!(serialize_yaml(&node).unwrap(), "a:\n  b: value\n");
//! ```

use super::node::{YamlNode, YamlValue};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::Value as SerdeValue;

/// Parses a single YAML document into a `YamlNode`.
///
/// Blank input yields a null node rather than an error, so an empty
/// embedded document behaves like an unset one.
///
/// # Errors
///
/// Returns an error if the input is not valid YAML or contains more than one
/// document.
pub fn parse_yaml(yaml_str: &str) -> Result<YamlNode> {
    if yaml_str.trim().is_empty() {
        return Ok(YamlNode::new(YamlValue::Null));
    }
    let value: SerdeValue = serde_yaml::from_str(yaml_str).context("Failed to parse YAML")?;
    Ok(from_serde_value(&value))
}

/// Parses a multi-document YAML stream (documents separated by `---`).
///
/// Empty documents (for example a trailing `---`) are skipped.
pub fn parse_yaml_stream(yaml_str: &str) -> Result<Vec<YamlNode>> {
    let mut nodes = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(yaml_str).enumerate() {
        let value = SerdeValue::deserialize(document)
            .with_context(|| format!("Failed to parse YAML document {}", index + 1))?;
        if value.is_null() {
            continue;
        }
        nodes.push(from_serde_value(&value));
    }
    Ok(nodes)
}

/// Serializes a node to a YAML string (with trailing newline).
pub fn serialize_yaml(node: &YamlNode) -> Result<String> {
    serde_yaml::to_string(&to_serde_value(node)).context("Failed to serialize YAML")
}

/// Converts a `serde_yaml::Value` into a `YamlNode`.
///
/// Tags are dropped; the tagged value itself is kept. Non-string mapping
/// keys are converted to their textual form.
pub fn from_serde_value(value: &SerdeValue) -> YamlNode {
    let yaml_value = match value {
        SerdeValue::Mapping(map) => {
            let entries = map
                .iter()
                .map(|(k, v)| (key_to_string(k), from_serde_value(v)))
                .collect();
            YamlValue::Object(entries)
        }
        SerdeValue::Sequence(items) => YamlValue::Array(items.iter().map(from_serde_value).collect()),
        SerdeValue::String(s) => YamlValue::String(s.clone()),
        SerdeValue::Number(n) => YamlValue::Number(n.clone()),
        SerdeValue::Bool(b) => YamlValue::Boolean(*b),
        SerdeValue::Null => YamlValue::Null,
        SerdeValue::Tagged(tagged) => return from_serde_value(&tagged.value),
    };

    YamlNode::new(yaml_value)
}

/// Converts a `YamlNode` back into a `serde_yaml::Value`.
pub fn to_serde_value(node: &YamlNode) -> SerdeValue {
    match node.value() {
        YamlValue::Object(entries) => {
            let mut map = serde_yaml::Mapping::new();
            for (k, v) in entries {
                map.insert(SerdeValue::String(k.clone()), to_serde_value(v));
            }
            SerdeValue::Mapping(map)
        }
        YamlValue::Array(elements) => {
            SerdeValue::Sequence(elements.iter().map(to_serde_value).collect())
        }
        YamlValue::String(s) => SerdeValue::String(s.clone()),
        YamlValue::Number(n) => SerdeValue::Number(n.clone()),
        YamlValue::Boolean(b) => SerdeValue::Bool(*b),
        YamlValue::Null => SerdeValue::Null,
    }
}

fn key_to_string(key: &SerdeValue) -> String {
    match key {
        SerdeValue::String(s) => s.clone(),
        SerdeValue::Number(n) => n.to_string(),
        SerdeValue::Bool(b) => b.to_string(),
        SerdeValue::Null => "null".to_string(),
        SerdeValue::Tagged(tagged) => key_to_string(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
