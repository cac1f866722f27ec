//! Rule file schema.
//!
//! These types mirror the YAML a user writes and are deliberately loose:
//! every field is optional so that a malformed rule can be reported with a
//! precise message when the [`Replacer`](super::Replacer) is built, instead
//! of a generic deserialization error.
//!
//! ```yaml
//! replacements:
//! - source:
//!     objref:
//!       kind: ConfigMap
//!       name: cm
//!     fieldref: data.HOSTNAME
//!   target:
//!     objref:
//!       kind: Deployment
//!     fieldrefs:
//!     - spec.template.spec.containers.[name=app].args.[=HOSTNAME]
//! ```
//!
//! Unknown top-level keys (`apiVersion`, `kind`, `metadata`, ...) are
//! ignored so a full transformer resource can be used as a rule file.

use super::error::ReplacementError;
use crate::selector::Selector;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementConfig {
    pub replacements: Vec<ReplacementSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetSpec>,
}

/// Where a replacement value comes from. Exactly one of `value`, `objref`
/// and `multiref` may be set; `fieldref` belongs to `objref`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objref: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fieldref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiref: Option<MultiRefSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiRefSpec {
    pub refs: Vec<RefSpec>,
    pub template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objref: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fieldref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objref: Option<Selector>,
    pub fieldrefs: Vec<String>,
}

impl ReplacementConfig {
    /// Parses a rule set from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ReplacementError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads a rule set from an already-parsed YAML value, such as the
    /// `functionConfig` of a resource list.
    pub fn from_value(value: serde_yaml::Value) -> Result<Self, ReplacementError> {
        Ok(serde_yaml::from_value(value)?)
    }

    /// Loads a rule set from a file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse rules file: {}", path.display()))
    }
}
