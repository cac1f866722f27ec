//! Document model: YAML nodes, parsing/serialization and resources.

pub mod node;
pub mod parser;
pub mod resource;

pub use node::{NodeKind, YamlNode, YamlValue};
pub use resource::Resource;
