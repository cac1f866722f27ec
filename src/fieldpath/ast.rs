//! Abstract syntax tree types for field paths.

use std::fmt;

/// A segment in a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Mapping key (`name`). An integer-looking key also addresses a
    /// sequence position when the current node is a sequence.
    Key(String),
    /// Sequence position (`[2]`)
    Index(usize),
    /// First sequence element whose child `key` equals `value` (`[name=app]`).
    /// An empty key compares the element itself (`[=HOSTNAME]`); a dotted
    /// key follows nested mappings (`[metadata.name=x]`).
    Predicate { key: String, value: String },
}

impl PathSegment {
    /// Returns the position this segment addresses inside a sequence, if any.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(k) => k.parse().ok(),
            PathSegment::Predicate { .. } => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{}", k),
            PathSegment::Index(i) => write!(f, "[{}]", i),
            PathSegment::Predicate { key, value } => write!(f, "[{}={}]", key, value),
        }
    }
}

/// The segments addressing one level of document nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpan {
    pub segments: Vec<PathSegment>,
}

impl PathSpan {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for PathSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// A compiled field path: spans separated by `|`, plus the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    spans: Vec<PathSpan>,
    raw: String,
}

impl FieldPath {
    /// Creates a field path from already-parsed spans.
    pub fn new(spans: Vec<PathSpan>, raw: impl Into<String>) -> Self {
        Self {
            spans,
            raw: raw.into(),
        }
    }

    pub fn spans(&self) -> &[PathSpan] {
        &self.spans
    }

    /// The path as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
