use yamlreplace::document::node::{NodeKind, YamlNode};
use yamlreplace::document::parser::{parse_yaml, parse_yaml_stream};
use yamlreplace::fieldpath::{get, set, Evaluator, FieldPathError, Mutator, Parser};

fn path(p: &str) -> yamlreplace::fieldpath::FieldPath {
    Parser::parse(p).unwrap()
}

const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  template:
    spec:
      containers:
      - name: nginx
        image: nginx:1.7.9
        args:
        - HOSTNAME
        - PORT
      - name: sidecar
        image: envoy:1.0
"#;

#[test]
fn test_get_through_predicates_and_indexes() {
    let root = parse_yaml(DEPLOYMENT).unwrap();

    let image = get(&root, &path("spec.template.spec.containers[name=sidecar].image")).unwrap();
    assert_eq!(image.as_scalar_text().as_deref(), Some("envoy:1.0"));

    let first = get(&root, &path("spec.template.spec.containers[0].name")).unwrap();
    assert_eq!(first.as_scalar_text().as_deref(), Some("nginx"));

    let by_key = get(&root, &path("spec.template.spec.containers.1.name")).unwrap();
    assert_eq!(by_key.as_scalar_text().as_deref(), Some("sidecar"));

    let arg = get(&root, &path("spec.template.spec.containers[name=nginx].args[=PORT]")).unwrap();
    assert_eq!(arg.as_scalar_text().as_deref(), Some("PORT"));
}

#[test]
fn test_get_missing_field_and_no_match() {
    let root = parse_yaml(DEPLOYMENT).unwrap();

    assert!(matches!(
        get(&root, &path("spec.replicas")),
        Err(FieldPathError::NotFound { .. })
    ));
    assert!(matches!(
        get(&root, &path("spec.template.spec.containers[name=redis]")),
        Err(FieldPathError::NoMatch { .. })
    ));
    assert!(matches!(
        get(&root, &path("spec.template.spec.containers[7]")),
        Err(FieldPathError::OutOfBounds { .. })
    ));
}

#[test]
fn test_get_through_wrong_kind() {
    let root = parse_yaml(DEPLOYMENT).unwrap();
    let err = get(&root, &path("metadata.name.first")).unwrap_err();
    assert!(matches!(err, FieldPathError::KindMismatch { .. }));
}

#[test]
fn test_set_then_get_returns_value() {
    let mut root = parse_yaml(DEPLOYMENT).unwrap();
    let target = path("spec.template.spec.containers[name=nginx].image");

    set(&mut root, &target, YamlNode::string("nginx:latest")).unwrap();

    let image = get(&root, &target).unwrap();
    assert_eq!(image.as_scalar_text().as_deref(), Some("nginx:latest"));
}

#[test]
fn test_set_creates_missing_mappings() {
    let mut root = parse_yaml("metadata:\n  name: x\n").unwrap();
    set(&mut root, &path("spec.non.existent.field"), YamlNode::string("v")).unwrap();

    assert_eq!(
        root,
        parse_yaml("metadata:\n  name: x\nspec:\n  non:\n    existent:\n      field: v\n").unwrap()
    );
}

#[test]
fn test_set_creates_sequence_element_for_predicate() {
    let mut root = parse_yaml("spec: {}\n").unwrap();
    set(
        &mut root,
        &path("spec.containers[name=app].image"),
        YamlNode::string("app:1"),
    )
    .unwrap();

    assert_eq!(
        root,
        parse_yaml("spec:\n  containers:\n  - name: app\n    image: app:1\n").unwrap()
    );
}

#[test]
fn test_set_into_null_root() {
    let mut root = parse_yaml("").unwrap();
    set(&mut root, &path("a.b"), YamlNode::string("c")).unwrap();
    assert_eq!(root, parse_yaml("a:\n  b: c\n").unwrap());
}

#[test]
fn test_set_refuses_to_replace_container_with_scalar() {
    let mut root = parse_yaml(DEPLOYMENT).unwrap();
    let before = root.clone();

    let err = set(&mut root, &path("spec.template"), YamlNode::string("flat")).unwrap_err();

    assert!(matches!(err, FieldPathError::KindMismatch { .. }));
    assert_eq!(root, before);
}

#[test]
fn test_set_through_empty_string_is_error() {
    let mut root = parse_yaml("data:\n  config: \"\"\n").unwrap();
    let err = set(&mut root, &path("data.config.nested"), YamlNode::string("x")).unwrap_err();
    assert!(matches!(err, FieldPathError::EmptyScalar { .. }));
}

#[test]
fn test_set_index_out_of_range_does_not_append() {
    let mut root = parse_yaml("items:\n- a\n").unwrap();
    let err = set(&mut root, &path("items[1]"), YamlNode::string("b")).unwrap_err();
    assert!(matches!(err, FieldPathError::OutOfBounds { .. }));
    assert_eq!(root, parse_yaml("items:\n- a\n").unwrap());
}

#[test]
fn test_nested_document_round_trip() {
    let mut root = parse_yaml(
        r#"
data:
  values.yaml: |
    image:
      repository: nginx
      tag: "1.0"
"#,
    )
    .unwrap();
    let tag = path("data.values\\.yaml|image.tag");

    assert_eq!(get(&root, &tag).unwrap().as_scalar_text().as_deref(), Some("1.0"));

    set(&mut root, &tag, YamlNode::string("2.0")).unwrap();

    assert_eq!(get(&root, &tag).unwrap().as_scalar_text().as_deref(), Some("2.0"));
    let text = get(&root, &path("data.values\\.yaml"))
        .unwrap()
        .as_scalar_text()
        .unwrap();
    assert_eq!(
        parse_yaml_stream(&text).unwrap(),
        vec![parse_yaml("image:\n  repository: nginx\n  tag: \"2.0\"\n").unwrap()]
    );
}

#[test]
fn test_nested_documents_two_levels() {
    let inner = "level2: |\n  key: old\n";
    let outer = serde_yaml::to_string(&serde_yaml::Mapping::from_iter([(
        serde_yaml::Value::from("level1"),
        serde_yaml::Value::from(inner),
    )]))
    .unwrap();
    let mut root = parse_yaml(&outer).unwrap();
    let key = path("level1|level2|key");

    set(&mut root, &key, YamlNode::string("new")).unwrap();

    assert_eq!(get(&root, &key).unwrap().as_scalar_text().as_deref(), Some("new"));
}

#[test]
fn test_depth_limit_applies_to_nested_spans() {
    let root = parse_yaml("a: \"b: c\"\n").unwrap();
    let nested = path("a|b");

    assert!(Evaluator::with_max_depth(1).get(&root, &nested).is_ok());
    assert!(matches!(
        Evaluator::with_max_depth(0).get(&root, &nested),
        Err(FieldPathError::DepthExceeded { .. })
    ));

    let mut writable = root.clone();
    assert!(matches!(
        Mutator::with_max_depth(0).set(&mut writable, &nested, YamlNode::string("d")),
        Err(FieldPathError::DepthExceeded { .. })
    ));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(Parser::parse(""), Err(FieldPathError::Empty)));
    assert!(Parser::parse("a[name=x").is_err());
    assert!(Parser::parse("a]").is_err());
    assert!(Parser::parse("a||b").is_err());
    assert!(Parser::parse("a[x]y").is_err());
}

#[test]
fn test_display_round_trips_path_text() {
    let raw = "spec.containers[name=app].image";
    assert_eq!(path(raw).to_string(), raw);
}

#[test]
fn test_scalar_source_kind() {
    let root = parse_yaml("data:\n  PORT: 8080\n").unwrap();
    let port = get(&root, &path("data.PORT")).unwrap();
    assert_eq!(port.kind(), NodeKind::Scalar);
    assert_eq!(port.as_scalar_text().as_deref(), Some("8080"));
}

#[test]
fn test_writing_current_value_back_leaves_tree_unchanged() {
    let yaml = r#"
metadata:
  name: web
spec:
  ratio: 1.0
  limit: 18446744073709551615
  containers:
  - name: app
    image: app:1
  - name: sidecar
    image: envoy:1.0
data:
  config.yaml: |
    server:
      host: localhost
      port: 5432
    name: app
"#;
    let original = parse_yaml(yaml).unwrap();

    for raw in [
        "metadata.name",
        "spec.ratio",
        "spec.limit",
        "spec.containers[name=sidecar]",
        "spec.containers[name=app].image",
        "data.config\\.yaml|server.port",
        "data.config\\.yaml|server",
    ] {
        let target = path(raw);
        let mut root = original.clone();
        let current = get(&root, &target).unwrap();
        set(&mut root, &target, current).unwrap();
        assert_eq!(root, original, "path {}", raw);
    }
}

#[test]
fn test_float_predicate_and_large_integer() {
    let root = parse_yaml("- v: 1.0\n  name: a\n- v: 18446744073709551615\n  name: b\n").unwrap();
    assert_eq!(
        get(&root, &path("[v=1.0].name")).unwrap().as_scalar_text().as_deref(),
        Some("a")
    );
    assert_eq!(
        get(&root, &path("[v=18446744073709551615].name"))
            .unwrap()
            .as_scalar_text()
            .as_deref(),
        Some("b")
    );
}
