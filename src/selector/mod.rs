//! Resource selection: metadata selectors and label expressions.

pub mod error;
pub mod label;
pub mod matcher;

pub use error::SelectorError;
pub use label::{parse_label_set, LabelSelector, Operator, Requirement};
pub use matcher::{ResourceMatcher, Selector};
