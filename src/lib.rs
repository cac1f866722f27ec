//! yamlreplace - field-path addressing and value replacement for YAML
//! resource collections.
//!
//! - [`document`]: node model, YAML parsing/serialization and resources
//! - [`fieldpath`]: parsing field paths and reading/writing through them
//! - [`selector`]: picking resources by metadata and label expressions
//! - [`replacement`]: rule sets that copy values between resources
//! - [`file`] and [`config`]: I/O and user settings for the CLI

pub mod config;
pub mod document;
pub mod fieldpath;
pub mod file;
pub mod replacement;
pub mod selector;
