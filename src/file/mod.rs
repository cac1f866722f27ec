//! File I/O for resource collections.
//!
//! This module loads resources from files or stdin (plain or gzip, stream or
//! resource list) and writes them back with atomic writes and optional
//! backups.

pub mod loader;
pub mod saver;

use crate::document::resource::Resource;

/// The shape the resources were read in, so they can be written back the
/// same way.
#[derive(Debug, Clone, PartialEq)]
pub enum InputFormat {
    /// Documents separated by `---`.
    Stream,
    /// A single `kind: ResourceList` document. `envelope` is the whole
    /// document as read; its `items` are replaced on output.
    ResourceList { envelope: serde_yaml::Value },
}

/// Everything read from one input.
#[derive(Debug, Clone)]
pub struct ResourceInput {
    pub resources: Vec<Resource>,
    /// Rules embedded in a resource list, if any.
    pub function_config: Option<serde_yaml::Value>,
    pub format: InputFormat,
}
