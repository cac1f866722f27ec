//! Error types for field path parsing, lookup and mutation.

use crate::document::node::NodeKind;
use thiserror::Error;

/// Errors that can occur while parsing a field path or applying it to a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldPathError {
    #[error("empty field path")]
    Empty,

    #[error("unclosed '[' at position {position} in '{path}'")]
    UnclosedBracket { path: String, position: usize },

    #[error("unexpected '{found}' at position {position} in '{path}'")]
    UnexpectedChar {
        path: String,
        position: usize,
        found: char,
    },

    #[error("invalid segment '{segment}' in '{path}': {message}")]
    InvalidSegment {
        path: String,
        segment: String,
        message: String,
    },

    #[error("field '{segment}' not found")]
    NotFound { segment: String },

    #[error("no sequence element matches '{segment}'")]
    NoMatch { segment: String },

    #[error("index {index} out of range for sequence of length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("expected {expected} at '{segment}', found {found}")]
    KindMismatch {
        segment: String,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("empty scalar at '{segment}' cannot be reinterpreted as {expected}")]
    EmptyScalar { segment: String, expected: NodeKind },

    #[error("nested document at '{span}' is not valid YAML: {message}")]
    NestedParse { span: String, message: String },

    #[error("nested document at '{span}' could not be serialized: {message}")]
    NestedSerialize { span: String, message: String },

    #[error("nested documents exceed the maximum depth of {max}")]
    DepthExceeded { max: usize },
}
