//! Read-only resolution of field paths.
//!
//! Each span is resolved against its own root; between spans the terminal
//! scalar of the previous span is parsed as a fresh YAML document. Lookups
//! never create anything: a missing key, an unmatched predicate or an
//! out-of-range index is an error.

use super::ast::{FieldPath, PathSegment, PathSpan};
use super::error::FieldPathError;
use crate::document::node::{NodeKind, YamlNode, YamlValue};
use crate::document::parser::parse_yaml;

/// Default bound on document-in-scalar nesting.
pub const DEFAULT_MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    max_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of nested documents a path may descend into.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Resolves `path` against `root` and returns a copy of the terminal node.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlreplace::document::parser::parse_yaml;
    /// use yamlreplace::fieldpath::{Evaluator, Parser};
    ///
    /// let root = parse_yaml("a:\n  b: |\n    c:\n      d: innerValue\n").unwrap();
    /// let path = Parser::parse("a.b|c.d").unwrap();
    /// let value = Evaluator::new().get(&root, &path).unwrap();
    /// assert_eq!(value.as_scalar_text().as_deref(), Some("innerValue"));
    /// ```
    pub fn get(&self, root: &YamlNode, path: &FieldPath) -> Result<YamlNode, FieldPathError> {
        self.get_spans(root, path.spans(), 0)
    }

    fn get_spans(
        &self,
        node: &YamlNode,
        spans: &[PathSpan],
        depth: usize,
    ) -> Result<YamlNode, FieldPathError> {
        let (span, rest) = spans.split_first().ok_or(FieldPathError::Empty)?;
        let target = resolve_span(node, span)?;
        if rest.is_empty() {
            return Ok(target.clone());
        }
        if depth >= self.max_depth {
            return Err(FieldPathError::DepthExceeded {
                max: self.max_depth,
            });
        }
        let nested = parse_nested(target, span)?;
        self.get_spans(&nested, rest, depth + 1)
    }
}

/// Resolves `path` with the default nesting bound.
pub fn get(root: &YamlNode, path: &FieldPath) -> Result<YamlNode, FieldPathError> {
    Evaluator::default().get(root, path)
}

/// Walks every segment of one span, left to right.
pub fn resolve_span<'a>(node: &'a YamlNode, span: &PathSpan) -> Result<&'a YamlNode, FieldPathError> {
    span.segments
        .iter()
        .try_fold(node, |current, segment| resolve_segment(current, segment))
}

fn resolve_segment<'a>(
    node: &'a YamlNode,
    segment: &PathSegment,
) -> Result<&'a YamlNode, FieldPathError> {
    match (node.value(), segment) {
        (YamlValue::Object(entries), PathSegment::Key(key)) => {
            entries.get(key).ok_or_else(|| FieldPathError::NotFound {
                segment: key.clone(),
            })
        }
        (YamlValue::Array(items), PathSegment::Key(_) | PathSegment::Index(_)) => {
            match segment.as_index() {
                Some(index) => items.get(index).ok_or(FieldPathError::OutOfBounds {
                    index,
                    len: items.len(),
                }),
                None => Err(kind_mismatch(segment, NodeKind::Mapping, node)),
            }
        }
        (YamlValue::Array(items), PathSegment::Predicate { key, value }) => items
            .iter()
            .find(|item| predicate_matches(item, key, value))
            .ok_or_else(|| FieldPathError::NoMatch {
                segment: segment.to_string(),
            }),
        (_, PathSegment::Key(_)) => Err(kind_mismatch(segment, NodeKind::Mapping, node)),
        (_, _) => Err(kind_mismatch(segment, NodeKind::Sequence, node)),
    }
}

/// Checks whether a sequence element satisfies `[key=value]`.
///
/// The comparison is textual, so `[port=8080]` matches an integer field.
pub(crate) fn predicate_matches(element: &YamlNode, key: &str, value: &str) -> bool {
    let field = if key.is_empty() {
        Some(element)
    } else {
        key.split('.')
            .try_fold(element, |node, part| node.get(part))
    };
    field
        .and_then(YamlNode::as_scalar_text)
        .is_some_and(|text| text == value)
}

/// Parses the scalar at the end of `span` as an embedded document.
pub(crate) fn parse_nested(node: &YamlNode, span: &PathSpan) -> Result<YamlNode, FieldPathError> {
    let text = node.as_scalar_text().ok_or_else(|| FieldPathError::KindMismatch {
        segment: span.to_string(),
        expected: NodeKind::Scalar,
        found: node.kind(),
    })?;
    parse_yaml(&text).map_err(|e| FieldPathError::NestedParse {
        span: span.to_string(),
        message: format!("{:#}", e),
    })
}

pub(crate) fn kind_mismatch(segment: &PathSegment, expected: NodeKind, found: &YamlNode) -> FieldPathError {
    FieldPathError::KindMismatch {
        segment: segment.to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldpath::Parser;

    fn eval(yaml: &str, path: &str) -> Result<YamlNode, FieldPathError> {
        let root = parse_yaml(yaml).unwrap();
        get(&root, &Parser::parse(path).unwrap())
    }

    fn text(yaml: &str, path: &str) -> String {
        eval(yaml, path).unwrap().as_scalar_text().unwrap()
    }

    const LIST: &str = "a:\n  b:\n  - c: value1\n    d: data1\n  - c: value2\n    d: data2\n";

    #[test]
    fn test_get_nested_keys() {
        assert_eq!(text("a:\n  b:\n    c: value\n", "a.b.c"), "value");
        assert_eq!(text("a:\n  b:\n    c: value\n", ".a.b.c"), "value");
    }

    #[test]
    fn test_get_predicate() {
        assert_eq!(text(LIST, "a.b[c=value1].d"), "data1");
        assert_eq!(text(LIST, "a.b.[c=value2].d"), "data2");
    }

    #[test]
    fn test_get_predicate_value_with_dots() {
        let yaml = "a:\n  b:\n  - c: value.1\n    d: data1\n  - c: value.2\n    d: data2\n";
        assert_eq!(text(yaml, "a.b[c=value.1].d"), "data1");
    }

    #[test]
    fn test_get_index_forms() {
        assert_eq!(text(LIST, "a.b[1].d"), "data2");
        assert_eq!(text(LIST, "a.b.1.d"), "data2");
    }

    #[test]
    fn test_get_predicate_first_match() {
        let yaml = "- name: x\n  v: 1\n- name: x\n  v: 2\n";
        assert_eq!(text(yaml, "[name=x].v"), "1");
    }

    #[test]
    fn test_get_scalar_element_predicate() {
        let yaml = "args:\n- echo\n- HOSTNAME\n";
        assert_eq!(text(yaml, "args.[=HOSTNAME]"), "HOSTNAME");
    }

    #[test]
    fn test_get_numeric_predicate_value() {
        let yaml = "ports:\n- port: 8080\n  name: http\n";
        assert_eq!(text(yaml, "ports.[port=8080].name"), "http");
    }

    #[test]
    fn test_get_float_and_large_integer_predicates() {
        assert_eq!(text("- v: 1.0\n  name: a\n", "[v=1.0].name"), "a");
        let yaml = "- id: 18446744073709551615\n  name: big\n";
        assert_eq!(text(yaml, "[id=18446744073709551615].name"), "big");
    }

    #[test]
    fn test_get_nested_document() {
        let yaml = "a:\n  b: |\n    c:\n      d: innerValue\n";
        assert_eq!(text(yaml, ".a.b|c.d"), "innerValue");
    }

    #[test]
    fn test_get_doubly_nested_document() {
        let yaml = "a:\n  b: |\n    c:\n      d: innerValue1\n      e: \"f: innerValue2\"\n";
        assert_eq!(text(yaml, "a.b|c.e|f"), "innerValue2");
    }

    #[test]
    fn test_get_returns_structured_node() {
        let node = eval(LIST, "a.b").unwrap();
        assert_eq!(node.kind(), NodeKind::Sequence);
    }

    #[test]
    fn test_missing_key() {
        assert_eq!(
            eval(LIST, "a.x"),
            Err(FieldPathError::NotFound {
                segment: "x".to_string()
            })
        );
    }

    #[test]
    fn test_no_predicate_match() {
        assert!(matches!(
            eval(LIST, "a.b[c=nope].d"),
            Err(FieldPathError::NoMatch { .. })
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        assert_eq!(
            eval(LIST, "a.b[5]"),
            Err(FieldPathError::OutOfBounds { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_nested_span_requires_scalar() {
        assert!(matches!(
            eval(LIST, "a|b"),
            Err(FieldPathError::KindMismatch {
                expected: NodeKind::Scalar,
                found: NodeKind::Mapping,
                ..
            })
        ));
    }

    #[test]
    fn test_key_on_sequence_is_kind_mismatch() {
        assert!(matches!(
            eval(LIST, "a.b.c"),
            Err(FieldPathError::KindMismatch {
                expected: NodeKind::Mapping,
                found: NodeKind::Sequence,
                ..
            })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let root = parse_yaml("a: \"b: \\\"c: d\\\"\"\n").unwrap();
        let path = Parser::parse("a|b|c").unwrap();
        assert_eq!(
            Evaluator::new().get(&root, &path).unwrap().as_scalar_text(),
            Some("d".to_string())
        );
        assert_eq!(
            Evaluator::with_max_depth(1).get(&root, &path),
            Err(FieldPathError::DepthExceeded { max: 1 })
        );
    }
}
