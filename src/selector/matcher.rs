//! Selecting resources by metadata.
//!
//! A [`Selector`] is the user-facing description deserialized from a rule
//! file; [`ResourceMatcher`] is its compiled form. Every non-empty selector
//! field is one condition and all conditions must hold. Empty fields do not
//! constrain anything.

use super::error::SelectorError;
use super::label::{parse_label_set, LabelSelector};
use crate::document::node::{YamlNode, YamlValue};
use crate::document::resource::Resource;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata conditions picking resources out of a collection.
///
/// `apiVersion` is compared as a whole; `group` and `version` are compared
/// against the two halves of the resource's `apiVersion`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Selector {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub annotation_selector: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label_selector: String,
}

impl Selector {
    /// Shorthand for a kind/name selector.
    pub fn kind_name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("apiVersion", self.api_version.as_str()),
            ("group", self.group.as_str()),
            ("version", self.version.as_str()),
            ("kind", self.kind.as_str()),
            ("name", self.name.as_str()),
            ("namespace", self.namespace.as_str()),
            ("annotationSelector", self.annotation_selector.as_str()),
            ("labelSelector", self.label_selector.as_str()),
        ]
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<String> = self
            .fields()
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        write!(f, "{{{}}}", set.join(", "))
    }
}

/// A compiled selector.
#[derive(Debug, Clone)]
pub struct ResourceMatcher {
    api_version: Option<String>,
    group: Option<String>,
    version: Option<String>,
    kind: Option<String>,
    name: Option<String>,
    namespace: Option<String>,
    annotations: Option<LabelSelector>,
    labels: Option<LabelSelector>,
    description: String,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn label_expression(expression: &str) -> Result<Option<LabelSelector>, SelectorError> {
    let selector = LabelSelector::parse(expression)?;
    Ok((!selector.is_empty()).then_some(selector))
}

impl ResourceMatcher {
    /// Compiles `selector`, parsing its label and annotation expressions.
    pub fn compile(selector: &Selector) -> Result<Self, SelectorError> {
        Ok(Self {
            api_version: non_empty(&selector.api_version),
            group: non_empty(&selector.group),
            version: non_empty(&selector.version),
            kind: non_empty(&selector.kind),
            name: non_empty(&selector.name),
            namespace: non_empty(&selector.namespace),
            annotations: label_expression(&selector.annotation_selector)?,
            labels: label_expression(&selector.label_selector)?,
            description: selector.to_string(),
        })
    }

    /// Returns true if `resource` satisfies every condition.
    pub fn matches(&self, resource: &Resource) -> Result<bool, SelectorError> {
        let scalar_checks = [
            (&self.api_version, resource.api_version()),
            (&self.group, Some(resource.group())),
            (&self.version, Some(resource.version())),
            (&self.kind, resource.kind()),
            (&self.name, resource.name()),
            (&self.namespace, resource.namespace()),
        ];
        for (expected, actual) in scalar_checks {
            if let Some(expected) = expected {
                if actual.as_deref() != Some(expected.as_str()) {
                    return Ok(false);
                }
            }
        }

        if let Some(selector) = &self.labels {
            if !selector.matches(&label_set(resource.labels_node())?) {
                return Ok(false);
            }
        }
        if let Some(selector) = &self.annotations {
            if !selector.matches(&label_set(resource.annotations_node())?) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Positions of all matching resources, in collection order.
    pub fn filter_indices(&self, resources: &[Resource]) -> Result<Vec<usize>, SelectorError> {
        let mut indices = Vec::new();
        for (i, resource) in resources.iter().enumerate() {
            if self.matches(resource)? {
                indices.push(i);
            }
        }
        Ok(indices)
    }

    /// All matching resources, in collection order.
    pub fn filter<'a>(&self, resources: &'a [Resource]) -> Result<Vec<&'a Resource>, SelectorError> {
        Ok(self
            .filter_indices(resources)?
            .into_iter()
            .map(|i| &resources[i])
            .collect())
    }

    /// Position of the single matching resource.
    ///
    /// Zero matches and several matches are distinct errors.
    pub fn find_one(&self, resources: &[Resource]) -> Result<usize, SelectorError> {
        let indices = self.filter_indices(resources)?;
        match indices.as_slice() {
            [index] => Ok(*index),
            [] => Err(SelectorError::NotFound {
                selector: self.description.clone(),
            }),
            _ => Err(SelectorError::Ambiguous {
                selector: self.description.clone(),
                count: indices.len(),
            }),
        }
    }
}

impl fmt::Display for ResourceMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// Reads labels or annotations, given either as a mapping or as a
/// `k=v,k2=v2` string.
fn label_set(node: Option<&YamlNode>) -> Result<IndexMap<String, String>, SelectorError> {
    let Some(node) = node else {
        return Ok(IndexMap::new());
    };
    match node.value() {
        YamlValue::Object(entries) => Ok(entries
            .iter()
            .filter_map(|(k, v)| v.as_scalar_text().map(|text| (k.clone(), text)))
            .collect()),
        YamlValue::Array(_) => Err(SelectorError::InvalidLabelSet {
            labels: "<sequence>".to_string(),
            message: "expected a mapping or a key=value string".to_string(),
        }),
        _ => match node.as_scalar_text() {
            Some(text) => parse_label_set(&text),
            None => Ok(IndexMap::new()),
        },
    }
}
