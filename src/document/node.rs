//! YAML node representation used by the field-path engine.
//!
//! Every value in a resource is wrapped in a `YamlNode`. Mappings keep their
//! insertion order (backed by `IndexMap`) so that a document written back out
//! looks like the one that was read in, apart from the fields that were
//! actually replaced.
//!
//! # Example
//!
//! ```
//! use yamlreplace::document::node::{NodeKind, YamlNode, YamlValue};
//! use indexmap::IndexMap;
//! ```

use indexmap::IndexMap;
use std::fmt;

/// The three structural shapes a node can take.
///
/// Strings, numbers, booleans and null are all scalars as far as path
/// resolution is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mapping,
    Sequence,
    Scalar,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Mapping => write!(f, "mapping"),
            NodeKind::Sequence => write!(f, "sequence"),
            NodeKind::Scalar => write!(f, "scalar"),
        }
    }
}

impl NodeKind {
    /// Returns an empty node of this kind (an empty string for scalars).
    pub fn empty_node(self) -> YamlNode {
        match self {
            NodeKind::Mapping => YamlNode::new(YamlValue::Object(IndexMap::new())),
            NodeKind::Sequence => YamlNode::new(YamlValue::Array(Vec::new())),
            NodeKind::Scalar => YamlNode::string(""),
        }
    }
}

/// A YAML value.
///
/// Numbers keep `serde_yaml`'s own representation, so an integer beyond
/// `i64` stays exact and a float's text is the text the serializer emits.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    /// A YAML mapping; keys keep insertion order
    Object(IndexMap<String, YamlNode>),
    /// A YAML sequence
    Array(Vec<YamlNode>),
    String(String),
    Number(serde_yaml::Number),
    Boolean(bool),
    Null,
}

impl YamlValue {
    /// Returns true if this value is an object.
    pub fn is_object(&self) -> bool {
        matches!(self, YamlValue::Object(_))
    }

    /// Returns true if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, YamlValue::Array(_))
    }

    /// Returns the structural kind of this value.
    pub fn kind(&self) -> NodeKind {
        match self {
            YamlValue::Object(_) => NodeKind::Mapping,
            YamlValue::Array(_) => NodeKind::Sequence,
            _ => NodeKind::Scalar,
        }
    }
}

/// One node of a resource tree.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    value: YamlValue,
}

impl YamlNode {
    pub fn new(value: YamlValue) -> Self {
        Self { value }
    }

    /// Creates a plain string scalar.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlreplace::document::node::YamlNode;
    ///
    /// let node = YamlNode::string("nginx:newtag");
    /// assert_eq!(node.as_scalar_text().as_deref(), Some("nginx:newtag"));
    /// ```
    pub fn string(s: impl Into<String>) -> Self {
        Self::new(YamlValue::String(s.into()))
    }

    /// Returns an immutable reference to the node's value.
    pub fn value(&self) -> &YamlValue {
        &self.value
    }

    /// Returns a mutable reference to the node's value.
    pub fn value_mut(&mut self) -> &mut YamlValue {
        &mut self.value
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, YamlValue::Null)
    }

    /// Returns true for a string scalar with no content.
    pub fn is_empty_string(&self) -> bool {
        matches!(&self.value, YamlValue::String(s) if s.is_empty())
    }

    /// Returns the textual form of a scalar, or `None` for containers.
    ///
    /// Numbers and booleans render exactly as `serialize_yaml` writes them.
    /// Null renders as an empty string, matching how an unset field reads.
    pub fn as_scalar_text(&self) -> Option<String> {
        match &self.value {
            YamlValue::String(s) => Some(s.clone()),
            YamlValue::Number(n) => Some(n.to_string()),
            YamlValue::Boolean(b) => Some(b.to_string()),
            YamlValue::Null => Some(String::new()),
            YamlValue::Object(_) | YamlValue::Array(_) => None,
        }
    }

    /// Looks up a direct child of a mapping by key.
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        match &self.value {
            YamlValue::Object(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Follows a chain of mapping keys.
    pub fn get_path(&self, keys: &[&str]) -> Option<&YamlNode> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }
}
