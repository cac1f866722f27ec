use thiserror::Error;

/// Errors from parsing selectors and from selecting resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("invalid label selector '{selector}': {message}")]
    InvalidExpression { selector: String, message: String },

    #[error("invalid label set '{labels}': {message}")]
    InvalidLabelSet { labels: String, message: String },

    #[error("failed to find one resource matching {selector}")]
    NotFound { selector: String },

    #[error("found {count} resources matching {selector}, expected exactly one")]
    Ambiguous { selector: String, count: usize },
}
