//! A single resource (document) in a collection.
//!
//! `Resource` owns the root node of one YAML document and exposes the
//! metadata fields that selectors match on. The collection itself is a plain
//! `Vec<Resource>`; its order is the output order.
//!
//! # Example
//!
//! ```
//! use yamlreplace::document::parser::parse_yaml;
//! use yamlreplace::document::resource::Resource;
//!
//! let resource = Resource::new(parse_yaml(
//!     "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n",
//! ).unwrap());
//!
//! assert_eq!(resource.group(), "apps");
//! assert_eq!(resource.version(), "v1");
//! assert_eq!(resource.kind().as_deref(), Some("Deployment"));
//! assert_eq!(resource.name().as_deref(), Some("web"));
//! ```

use super::node::YamlNode;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    root: YamlNode,
}

impl Resource {
    pub fn new(root: YamlNode) -> Self {
        Self { root }
    }

    /// Returns a reference to the root node.
    pub fn root(&self) -> &YamlNode {
        &self.root
    }

    /// Returns a mutable reference to the root node.
    pub fn root_mut(&mut self) -> &mut YamlNode {
        &mut self.root
    }

    fn field_text(&self, keys: &[&str]) -> Option<String> {
        self.root
            .get_path(keys)
            .and_then(YamlNode::as_scalar_text)
            .filter(|s| !s.is_empty())
    }

    pub fn api_version(&self) -> Option<String> {
        self.field_text(&["apiVersion"])
    }

    /// API group derived from `apiVersion` (empty for the core group).
    pub fn group(&self) -> String {
        match self.api_version() {
            Some(api_version) => match api_version.split_once('/') {
                Some((group, _)) => group.to_string(),
                None => String::new(),
            },
            None => String::new(),
        }
    }

    /// API version derived from `apiVersion` (the part after the group).
    pub fn version(&self) -> String {
        match self.api_version() {
            Some(api_version) => match api_version.split_once('/') {
                Some((_, version)) => version.to_string(),
                None => api_version,
            },
            None => String::new(),
        }
    }

    pub fn kind(&self) -> Option<String> {
        self.field_text(&["kind"])
    }

    pub fn name(&self) -> Option<String> {
        self.field_text(&["metadata", "name"])
    }

    pub fn namespace(&self) -> Option<String> {
        self.field_text(&["metadata", "namespace"])
    }

    /// Raw `metadata.labels` node (mapping, or a `k=v,...` string).
    pub fn labels_node(&self) -> Option<&YamlNode> {
        self.root.get_path(&["metadata", "labels"])
    }

    /// Raw `metadata.annotations` node (mapping, or a `k=v,...` string).
    pub fn annotations_node(&self) -> Option<&YamlNode> {
        self.root.get_path(&["metadata", "annotations"])
    }
}

impl fmt::Display for Resource {
    /// Formats as `apiVersion/kind namespace/name` for log and error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_version = self.api_version().unwrap_or_default();
        let kind = self.kind().unwrap_or_else(|| "<no kind>".to_string());
        let name = self.name().unwrap_or_else(|| "<no name>".to_string());
        match self.namespace() {
            Some(ns) => write!(f, "{}/{} {}/{}", api_version, kind, ns, name),
            None => write!(f, "{}/{} {}", api_version, kind, name),
        }
    }
}
