//! Writing values through field paths.
//!
//! The last span is walked with lookup-or-create semantics: a missing
//! mapping key is created with the kind the following segment needs
//! (`required_kind`), and a predicate that matches nothing appends a new
//! element carrying the predicate field. Earlier spans are only looked up;
//! their terminal scalar is parsed, mutated recursively and serialized back
//! in place once the inner write succeeded.

use super::ast::{FieldPath, PathSegment, PathSpan};
use super::error::FieldPathError;
use super::evaluator::{kind_mismatch, parse_nested, predicate_matches, DEFAULT_MAX_DEPTH};
use crate::document::node::{NodeKind, YamlNode, YamlValue};
use crate::document::parser::serialize_yaml;
use indexmap::IndexMap;

/// Kind of container a segment needs to be applied to.
pub fn container_kind(segment: &PathSegment) -> NodeKind {
    match segment {
        PathSegment::Key(_) => NodeKind::Mapping,
        PathSegment::Index(_) | PathSegment::Predicate { .. } => NodeKind::Sequence,
    }
}

/// Kind the node reached by `spans[span_index].segments[segment_index]` must have.
///
/// Inside a span this is decided by the next segment. The last node of a
/// span that is followed by another span must be a scalar (it holds the
/// nested document); the last node of the last span takes the kind of the
/// value being written. Returns `None` for a position outside the path.
///
/// # Example
///
/// ```
/// use yamlreplace::document::node::NodeKind;
/// use yamlreplace::fieldpath::{required_kind, Parser};
///
/// let spans = Parser::parse_spans("spec.containers.[name=app]|image").unwrap();
/// assert_eq!(required_kind(&spans, 0, 0, NodeKind::Scalar), Some(NodeKind::Mapping));
/// assert_eq!(required_kind(&spans, 0, 1, NodeKind::Scalar), Some(NodeKind::Sequence));
/// assert_eq!(required_kind(&spans, 0, 2, NodeKind::Mapping), Some(NodeKind::Scalar));
/// assert_eq!(required_kind(&spans, 1, 0, NodeKind::Mapping), Some(NodeKind::Mapping));
/// ```
pub fn required_kind(
    spans: &[PathSpan],
    span_index: usize,
    segment_index: usize,
    value_kind: NodeKind,
) -> Option<NodeKind> {
    let segments = &spans.get(span_index)?.segments;
    if segment_index >= segments.len() {
        return None;
    }
    match segments.get(segment_index + 1) {
        Some(next) => Some(container_kind(next)),
        None if span_index + 1 < spans.len() => Some(NodeKind::Scalar),
        None => Some(value_kind),
    }
}

/// Whether an existing node of `kind` can take `next` as its next segment.
///
/// An integer-looking key is accepted by a sequence as a position.
fn accepts(kind: NodeKind, next: &PathSegment) -> bool {
    match next {
        PathSegment::Key(_) => {
            kind == NodeKind::Mapping || (kind == NodeKind::Sequence && next.as_index().is_some())
        }
        PathSegment::Index(_) | PathSegment::Predicate { .. } => kind == NodeKind::Sequence,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Mutator {
    max_depth: usize,
}

impl Default for Mutator {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Mutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of nested documents a path may descend into.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Writes `value` at `path`, creating missing intermediate nodes.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlreplace::document::node::YamlNode;
    /// use yamlreplace::document::parser::{parse_yaml, serialize_yaml};
    /// use yamlreplace::fieldpath::{Mutator, Parser};
    ///
    /// let mut root = parse_yaml("a:\n  b:\n    c: value\n").unwrap();
    /// let path = Parser::parse("a.b.c").unwrap();
    /// Mutator::new().set(&mut root, &path, YamlNode::string("new")).unwrap();
    /// assert_eq!(serialize_yaml(&root).unwrap(), "a:\n  b:\n    c: new\n");
    /// ```
    pub fn set(
        &self,
        root: &mut YamlNode,
        path: &FieldPath,
        value: YamlNode,
    ) -> Result<(), FieldPathError> {
        self.set_spans(root, path.spans(), 0, value)
    }

    fn set_spans(
        &self,
        node: &mut YamlNode,
        spans: &[PathSpan],
        index: usize,
        value: YamlNode,
    ) -> Result<(), FieldPathError> {
        let span = spans.get(index).ok_or(FieldPathError::Empty)?;
        if index + 1 == spans.len() {
            return write_span(node, spans, index, value);
        }
        if index >= self.max_depth {
            return Err(FieldPathError::DepthExceeded {
                max: self.max_depth,
            });
        }

        let holder = resolve_span_mut(node, span)?;
        let mut nested = parse_nested(holder, span)?;
        self.set_spans(&mut nested, spans, index + 1, value)?;
        let text = serialize_yaml(&nested).map_err(|e| FieldPathError::NestedSerialize {
            span: span.to_string(),
            message: format!("{:#}", e),
        })?;
        *holder.value_mut() = YamlValue::String(text);
        Ok(())
    }
}

/// Writes with the default nesting bound.
pub fn set(root: &mut YamlNode, path: &FieldPath, value: YamlNode) -> Result<(), FieldPathError> {
    Mutator::default().set(root, path, value)
}

/// Lookup without creation, used for spans that hold nested documents.
fn resolve_span_mut<'a>(
    node: &'a mut YamlNode,
    span: &PathSpan,
) -> Result<&'a mut YamlNode, FieldPathError> {
    let mut current = node;
    for segment in &span.segments {
        current = resolve_segment_mut(current, segment)?;
    }
    Ok(current)
}

fn resolve_segment_mut<'a>(
    node: &'a mut YamlNode,
    segment: &PathSegment,
) -> Result<&'a mut YamlNode, FieldPathError> {
    let found = node.kind();
    match (node.value_mut(), segment) {
        (YamlValue::Object(entries), PathSegment::Key(key)) => {
            entries.get_mut(key).ok_or_else(|| FieldPathError::NotFound {
                segment: key.clone(),
            })
        }
        (YamlValue::Array(items), PathSegment::Key(_) | PathSegment::Index(_)) => {
            match segment.as_index() {
                Some(index) => {
                    let len = items.len();
                    items
                        .get_mut(index)
                        .ok_or(FieldPathError::OutOfBounds { index, len })
                }
                None => Err(mismatch(segment, NodeKind::Mapping, found)),
            }
        }
        (YamlValue::Array(items), PathSegment::Predicate { key, value }) => items
            .iter_mut()
            .find(|item| predicate_matches(item, key, value))
            .ok_or_else(|| FieldPathError::NoMatch {
                segment: segment.to_string(),
            }),
        (_, PathSegment::Key(_)) => Err(mismatch(segment, NodeKind::Mapping, found)),
        (_, _) => Err(mismatch(segment, NodeKind::Sequence, found)),
    }
}

fn write_span(
    root: &mut YamlNode,
    spans: &[PathSpan],
    index: usize,
    value: YamlNode,
) -> Result<(), FieldPathError> {
    let segments = &spans[index].segments;
    let (last, parents) = segments.split_last().ok_or(FieldPathError::Empty)?;
    let value_kind = value.kind();

    if root.is_null() {
        *root = container_kind(&segments[0]).empty_node();
    }

    let mut current = root;
    for (i, segment) in parents.iter().enumerate() {
        let next = &segments[i + 1];
        let required = required_kind(spans, index, i, value_kind).unwrap_or(container_kind(next));
        current = descend_or_create(current, segment, next, required)?;
    }
    assign(current, last, value)
}

fn descend_or_create<'a>(
    node: &'a mut YamlNode,
    segment: &PathSegment,
    next: &PathSegment,
    required: NodeKind,
) -> Result<&'a mut YamlNode, FieldPathError> {
    let found = node.kind();
    let child = match (node.value_mut(), segment) {
        (YamlValue::Object(entries), PathSegment::Key(key)) => entries
            .entry(key.clone())
            .or_insert_with(|| required.empty_node()),
        (YamlValue::Array(items), PathSegment::Key(_) | PathSegment::Index(_)) => {
            match segment.as_index() {
                Some(index) => {
                    let len = items.len();
                    items
                        .get_mut(index)
                        .ok_or(FieldPathError::OutOfBounds { index, len })?
                }
                None => return Err(mismatch(segment, NodeKind::Mapping, found)),
            }
        }
        (YamlValue::Array(items), PathSegment::Predicate { key, value }) => {
            match items.iter().position(|item| predicate_matches(item, key, value)) {
                Some(position) => &mut items[position],
                None => {
                    let element = element_for_predicate(key, value, required).ok_or_else(|| {
                        FieldPathError::NoMatch {
                            segment: segment.to_string(),
                        }
                    })?;
                    items.push(element);
                    let position = items.len() - 1;
                    &mut items[position]
                }
            }
        }
        (_, PathSegment::Key(_)) => return Err(mismatch(segment, NodeKind::Mapping, found)),
        (_, _) => return Err(mismatch(segment, NodeKind::Sequence, found)),
    };

    if child.is_null() {
        *child = required.empty_node();
    } else if !accepts(child.kind(), next) {
        return Err(if child.is_empty_string() {
            FieldPathError::EmptyScalar {
                segment: segment.to_string(),
                expected: required,
            }
        } else {
            kind_mismatch(segment, required, child)
        });
    }
    Ok(child)
}

/// Builds the element appended when a predicate matches nothing.
///
/// Only mapping elements can be fabricated: `[a.b=v]` becomes `{a: {b: v}}`.
fn element_for_predicate(key: &str, value: &str, required: NodeKind) -> Option<YamlNode> {
    if key.is_empty() || required != NodeKind::Mapping {
        return None;
    }
    let element = key.rsplit('.').fold(YamlNode::string(value), |inner, part| {
        let mut entries = IndexMap::new();
        entries.insert(part.to_string(), inner);
        YamlNode::new(YamlValue::Object(entries))
    });
    Some(element)
}

/// Stores `value` under the final segment.
///
/// Mapping keys are created or replaced; a replaced node must have the
/// value's kind. Sequence elements (by index or first predicate match) are
/// removed and the value inserted at the same position.
fn assign(parent: &mut YamlNode, last: &PathSegment, value: YamlNode) -> Result<(), FieldPathError> {
    let found = parent.kind();
    let value_kind = value.kind();
    match (parent.value_mut(), last) {
        (YamlValue::Object(entries), PathSegment::Key(key)) => {
            if let Some(existing) = entries.get(key) {
                check_replaceable(existing, last, value_kind)?;
            }
            entries.insert(key.clone(), value);
            Ok(())
        }
        (YamlValue::Array(items), PathSegment::Key(_) | PathSegment::Index(_)) => {
            match last.as_index() {
                Some(index) if index < items.len() => {
                    items.remove(index);
                    items.insert(index, value);
                    Ok(())
                }
                Some(index) => Err(FieldPathError::OutOfBounds {
                    index,
                    len: items.len(),
                }),
                None => Err(mismatch(last, NodeKind::Mapping, found)),
            }
        }
        (YamlValue::Array(items), PathSegment::Predicate { key, value: wanted }) => {
            let position = items
                .iter()
                .position(|item| predicate_matches(item, key, wanted))
                .ok_or_else(|| FieldPathError::NoMatch {
                    segment: last.to_string(),
                })?;
            items.remove(position);
            items.insert(position, value);
            Ok(())
        }
        (_, PathSegment::Key(_)) => Err(mismatch(last, NodeKind::Mapping, found)),
        (_, _) => Err(mismatch(last, NodeKind::Sequence, found)),
    }
}

fn check_replaceable(
    existing: &YamlNode,
    segment: &PathSegment,
    value_kind: NodeKind,
) -> Result<(), FieldPathError> {
    if existing.is_null() || existing.kind() == value_kind {
        return Ok(());
    }
    if existing.is_empty_string() {
        return Err(FieldPathError::EmptyScalar {
            segment: segment.to_string(),
            expected: value_kind,
        });
    }
    Err(kind_mismatch(segment, value_kind, existing))
}

fn mismatch(segment: &PathSegment, expected: NodeKind, found: NodeKind) -> FieldPathError {
    FieldPathError::KindMismatch {
        segment: segment.to_string(),
        expected,
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_yaml;
    use crate::fieldpath::evaluator::get;
    use crate::fieldpath::Parser;

    fn apply(yaml: &str, path: &str, value: YamlNode) -> Result<YamlNode, FieldPathError> {
        let mut root = parse_yaml(yaml).unwrap();
        set(&mut root, &Parser::parse(path).unwrap(), value)?;
        Ok(root)
    }

    fn read(root: &YamlNode, path: &str) -> Option<String> {
        get(root, &Parser::parse(path).unwrap())
            .ok()
            .and_then(|n| n.as_scalar_text())
    }

    #[test]
    fn test_required_kind_lookahead() {
        let spans = Parser::parse_spans("a.[k=v].b.0|c").unwrap();
        assert_eq!(required_kind(&spans, 0, 0, NodeKind::Scalar), Some(NodeKind::Sequence));
        assert_eq!(required_kind(&spans, 0, 1, NodeKind::Scalar), Some(NodeKind::Mapping));
        assert_eq!(required_kind(&spans, 0, 2, NodeKind::Scalar), Some(NodeKind::Mapping));
        assert_eq!(required_kind(&spans, 0, 3, NodeKind::Mapping), Some(NodeKind::Scalar));
        assert_eq!(required_kind(&spans, 1, 0, NodeKind::Sequence), Some(NodeKind::Sequence));
        assert_eq!(required_kind(&spans, 1, 1, NodeKind::Scalar), None);
        assert_eq!(required_kind(&spans, 2, 0, NodeKind::Scalar), None);
    }

    #[test]
    fn test_accepts_numeric_key_on_sequence() {
        assert!(accepts(NodeKind::Sequence, &PathSegment::Key("1".to_string())));
        assert!(!accepts(NodeKind::Sequence, &PathSegment::Key("x".to_string())));
        assert!(accepts(NodeKind::Mapping, &PathSegment::Key("1".to_string())));
        assert!(!accepts(NodeKind::Mapping, &PathSegment::Index(0)));
    }

    #[test]
    fn test_set_existing_scalar() {
        let root = apply("a:\n  b:\n    c: value\n", "a.b.c", YamlNode::string("newvalue")).unwrap();
        assert_eq!(root, parse_yaml("a:\n  b:\n    c: newvalue\n").unwrap());
    }

    #[test]
    fn test_set_creates_missing_mappings() {
        let root = apply("spec: {}\n", "spec.non.existent.field", YamlNode::string("pod1")).unwrap();
        assert_eq!(
            root,
            parse_yaml("spec:\n  non:\n    existent:\n      field: pod1\n").unwrap()
        );
    }

    #[test]
    fn test_set_predicate_leaves_siblings() {
        let yaml = "containers:\n- name: web\n  image: nginx:1\n- name: app\n  image: app:1\n";
        let root = apply(yaml, "containers.[name=app].image", YamlNode::string("app:2")).unwrap();
        assert_eq!(read(&root, "containers.[name=app].image").as_deref(), Some("app:2"));
        assert_eq!(read(&root, "containers.[name=web].image").as_deref(), Some("nginx:1"));
    }

    #[test]
    fn test_set_predicate_first_match_only() {
        let yaml = "- name: x\n  v: 1\n- name: x\n  v: 2\n";
        let root = apply(yaml, "[name=x].v", YamlNode::string("9")).unwrap();
        assert_eq!(read(&root, "[0].v").as_deref(), Some("9"));
        assert_eq!(read(&root, "[1].v").as_deref(), Some("2"));
    }

    #[test]
    fn test_set_predicate_creates_element() {
        let root = apply("containers: []\n", "containers.[name=app].image", YamlNode::string("app:1"))
            .unwrap();
        assert_eq!(
            root,
            parse_yaml("containers:\n- name: app\n  image: app:1\n").unwrap()
        );
    }

    #[test]
    fn test_set_creates_sequence_for_predicate() {
        let root = apply("spec: {}\n", "spec.containers.[name=app].image", YamlNode::string("x"))
            .unwrap();
        assert_eq!(read(&root, "spec.containers.[0].name").as_deref(), Some("app"));
    }

    #[test]
    fn test_final_predicate_replaces_in_place() {
        let yaml = "args:\n- echo\n- HOSTNAME\n- PORT\n";
        let root = apply(yaml, "args.[=HOSTNAME]", YamlNode::string("example.com")).unwrap();
        assert_eq!(root, parse_yaml("args:\n- echo\n- example.com\n- PORT\n").unwrap());
    }

    #[test]
    fn test_final_predicate_without_match_is_error() {
        let err = apply("args:\n- echo\n", "args.[=HOSTNAME]", YamlNode::string("x")).unwrap_err();
        assert!(matches!(err, FieldPathError::NoMatch { .. }));
    }

    #[test]
    fn test_replace_element_with_mapping() {
        let yaml = "containers:\n- image: busybox\n  name: myapp-container\n";
        let value = parse_yaml("name: repl\nimage: repl\n").unwrap();
        let root = apply(yaml, "containers.[name=myapp-container]", value).unwrap();
        assert_eq!(
            root,
            parse_yaml("containers:\n- name: repl\n  image: repl\n").unwrap()
        );
    }

    #[test]
    fn test_index_write_replaces_existing() {
        let root = apply("l:\n- a\n- b\n", "l.[1]", YamlNode::string("c")).unwrap();
        assert_eq!(root, parse_yaml("l:\n- a\n- c\n").unwrap());
        let root = apply("l:\n- a\n- b\n", "l.0", YamlNode::string("z")).unwrap();
        assert_eq!(root, parse_yaml("l:\n- z\n- b\n").unwrap());
    }

    #[test]
    fn test_index_write_never_appends() {
        let err = apply("l:\n- a\n", "l.[1]", YamlNode::string("b")).unwrap_err();
        assert_eq!(err, FieldPathError::OutOfBounds { index: 1, len: 1 });
        let err = apply("l:\n- a: 1\n", "l.[3].a", YamlNode::string("b")).unwrap_err();
        assert_eq!(err, FieldPathError::OutOfBounds { index: 3, len: 1 });
    }

    #[test]
    fn test_kind_mismatch_on_intermediate() {
        let err = apply("a: scalar\n", "a.b", YamlNode::string("x")).unwrap_err();
        assert!(matches!(
            err,
            FieldPathError::KindMismatch {
                expected: NodeKind::Mapping,
                found: NodeKind::Scalar,
                ..
            }
        ));
        let err = apply("a:\n  b: 1\n", "a.[k=v].c", YamlNode::string("x")).unwrap_err();
        assert!(matches!(
            err,
            FieldPathError::KindMismatch {
                expected: NodeKind::Sequence,
                found: NodeKind::Mapping,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_scalar_not_reinterpreted() {
        let err = apply("a: \"\"\n", "a.b", YamlNode::string("x")).unwrap_err();
        assert_eq!(
            err,
            FieldPathError::EmptyScalar {
                segment: "a".to_string(),
                expected: NodeKind::Mapping
            }
        );
    }

    #[test]
    fn test_null_is_treated_as_absent() {
        let root = apply("a: null\n", "a.b.c", YamlNode::string("x")).unwrap();
        assert_eq!(read(&root, "a.b.c").as_deref(), Some("x"));
        let root = apply("a: ~\n", "a", parse_yaml("k: v\n").unwrap()).unwrap();
        assert_eq!(read(&root, "a.k").as_deref(), Some("v"));
    }

    #[test]
    fn test_final_kind_mismatch_on_mapping_key() {
        let err = apply("a:\n  b: 1\n", "a", YamlNode::string("x")).unwrap_err();
        assert!(matches!(
            err,
            FieldPathError::KindMismatch {
                expected: NodeKind::Scalar,
                found: NodeKind::Mapping,
                ..
            }
        ));
    }

    #[test]
    fn test_set_structured_value() {
        let value = parse_yaml("- name: c\n  image: busybox\n").unwrap();
        let root = apply("kind: Deployment\n", "spec.template.spec.containers", value).unwrap();
        assert_eq!(
            read(&root, "spec.template.spec.containers.[name=c].image").as_deref(),
            Some("busybox")
        );
    }

    #[test]
    fn test_set_nested_document() {
        let yaml = "a:\n  b:\n    c: |\n      d:\n        e: value\n      keep: me\n";
        let root = apply(yaml, "a.b.c|d.e", YamlNode::string("newvalue")).unwrap();
        assert_eq!(read(&root, "a.b.c|d.e").as_deref(), Some("newvalue"));
        assert_eq!(read(&root, "a.b.c|keep").as_deref(), Some("me"));
        assert!(matches!(
            get(&root, &Parser::parse("a.b.c").unwrap()).unwrap().value(),
            YamlValue::String(_)
        ));
    }

    #[test]
    fn test_set_nested_creates_inside_empty_document() {
        let root = apply("config: \"\"\n", "config|server.port", YamlNode::string("80")).unwrap();
        assert_eq!(read(&root, "config|server.port").as_deref(), Some("80"));
    }

    #[test]
    fn test_set_nested_requires_existing_holder() {
        let err = apply("a: {}\n", "a.b|c", YamlNode::string("x")).unwrap_err();
        assert_eq!(
            err,
            FieldPathError::NotFound {
                segment: "b".to_string()
            }
        );
    }

    #[test]
    fn test_set_nested_requires_scalar_holder() {
        let err = apply("a:\n  b: {}\n", "a.b|c", YamlNode::string("x")).unwrap_err();
        assert!(matches!(
            err,
            FieldPathError::KindMismatch {
                expected: NodeKind::Scalar,
                ..
            }
        ));
    }

    #[test]
    fn test_set_depth_limit() {
        let mut root = parse_yaml("a: \"b: c\"\n").unwrap();
        let path = Parser::parse("a|b").unwrap();
        assert_eq!(
            Mutator::with_max_depth(0).set(&mut root, &path, YamlNode::string("x")),
            Err(FieldPathError::DepthExceeded { max: 0 })
        );
        Mutator::with_max_depth(1)
            .set(&mut root, &path, YamlNode::string("x"))
            .unwrap();
        assert_eq!(read(&root, "a|b").as_deref(), Some("x"));
    }

    #[test]
    fn test_set_with_current_value_leaves_tree_unchanged() {
        let original = parse_yaml("a:\n  b: 1.0\nitems:\n- v: 18446744073709551615\n  name: x\n").unwrap();
        for raw in ["a.b", "items.[name=x]", "items.[v=18446744073709551615].name"] {
            let path = Parser::parse(raw).unwrap();
            let mut root = original.clone();
            let current = get(&root, &path).unwrap();
            set(&mut root, &path, current).unwrap();
            assert_eq!(root, original, "path {}", raw);
        }
    }
}
