//! Errors raised while building or running a replacement rule set.
//!
//! `rule` is the zero-based position of the replacement in the rule file.

use super::template::TemplateError;
use crate::fieldpath::FieldPathError;
use crate::selector::SelectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplacementError {
    #[error("invalid replacement config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("replacement[{rule}]: `source` must be specified")]
    MissingSource { rule: usize },

    #[error("replacement[{rule}]: `target` must be specified")]
    MissingTarget { rule: usize },

    #[error("replacement[{rule}]: target `objref` must be specified")]
    MissingTargetSelector { rule: usize },

    #[error("replacement[{rule}]: exactly one of value, objref and multiref is allowed, found {count}")]
    SourceVariants { rule: usize, count: usize },

    #[error("replacement[{rule}]: `fieldref` requires `objref`")]
    FieldRefWithoutObjRef { rule: usize },

    #[error("replacement[{rule}]: multiref ref {index} has no `objref`")]
    MultiRefMissingObjRef { rule: usize, index: usize },

    #[error("replacement[{rule}]: invalid field path '{path}': {source}")]
    InvalidPath {
        rule: usize,
        path: String,
        source: FieldPathError,
    },

    #[error("replacement[{rule}]: invalid selector: {source}")]
    InvalidSelector { rule: usize, source: SelectorError },

    #[error("replacement[{rule}]: invalid substring pattern '{pattern}': {source}")]
    InvalidScope {
        rule: usize,
        pattern: String,
        source: regex::Error,
    },

    #[error("replacement[{rule}]: {source}")]
    Selection { rule: usize, source: SelectorError },

    #[error("replacement[{rule}]: field '{path}' of {resource}: {source}")]
    Field {
        rule: usize,
        path: String,
        resource: String,
        source: FieldPathError,
    },

    #[error("replacement[{rule}]: pattern '{pattern}' does not match '{value}' at '{path}' of {resource}")]
    ScopeNoMatch {
        rule: usize,
        pattern: String,
        value: String,
        path: String,
        resource: String,
    },

    #[error("replacement[{rule}]: substring pattern at '{path}' of {resource} needs scalar values")]
    ScopeNotScalar {
        rule: usize,
        path: String,
        resource: String,
    },

    #[error("replacement[{rule}]: multiref ref {index} ('{path}') is not a scalar")]
    MultiRefNotScalar {
        rule: usize,
        index: usize,
        path: String,
    },

    #[error("replacement[{rule}]: {source}")]
    Template { rule: usize, source: TemplateError },
}
