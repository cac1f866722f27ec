//! Field path addressing for YAML trees.
//!
//! A field path is a dot-separated list of segments, optionally split into
//! spans with `|` where the value reached by one span is a string holding
//! another YAML document:
//!
//! - `spec.template.spec.containers` - mapping keys
//! - `containers[1]` or `containers.1` - sequence position
//! - `containers.[name=app].image` - first element whose `name` is `app`
//! - `args.[=HOSTNAME]` - first scalar element equal to `HOSTNAME`
//! - `data.config|server.port` - `server.port` inside the document stored at `data.config`
//!
//! Square-bracket contents are taken literally, so `[c=value.1]` compares
//! against `value.1`.

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod mutator;
pub mod parser;

pub use ast::{FieldPath, PathSegment, PathSpan};
pub use error::FieldPathError;
pub use evaluator::{get, Evaluator, DEFAULT_MAX_DEPTH};
pub use mutator::{container_kind, required_kind, set, Mutator};
pub use parser::{split_substring_scope, Parser};
