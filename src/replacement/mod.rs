//! Replacement rules: copy values between resources.
//!
//! A rule reads a value from a literal, from one field of one resource, or
//! from several fields combined through a template, and writes it into the
//! listed fields of every resource its target selector matches.

pub mod config;
pub mod error;
pub mod replacer;
pub mod template;

pub use config::{MultiRefSpec, RefSpec, ReplacementConfig, ReplacementSpec, SourceSpec, TargetSpec};
pub use error::ReplacementError;
pub use replacer::{
    FieldRef, Replacement, Replacer, ReplacerOptions, Source, Target, TargetField, DEFAULT_FIELDREF,
};
pub use template::{PositionalTemplate, TemplateError, TemplateRenderer};
