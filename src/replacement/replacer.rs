//! Building and running replacement rules.
//!
//! [`Replacer::new`] validates the whole rule set up front: source shape,
//! selectors, label expressions, field paths and substring patterns. Nothing
//! is touched if any rule is malformed. [`Replacer::execute`] then applies
//! the rules in order; each rule sees the writes of the rules before it, and
//! the first failure stops the run.

use super::config::{ReplacementConfig, ReplacementSpec, SourceSpec, TargetSpec};
use super::error::ReplacementError;
use super::template::{PositionalTemplate, TemplateRenderer};
use crate::document::node::{NodeKind, YamlNode};
use crate::document::resource::Resource;
use crate::fieldpath::{split_substring_scope, Evaluator, FieldPath, Mutator, Parser, DEFAULT_MAX_DEPTH};
use crate::selector::{ResourceMatcher, Selector};
use regex::Regex;
use tracing::{debug, info, warn};

/// Field read when a source reference names no field.
pub const DEFAULT_FIELDREF: &str = "metadata.name";

/// Settings that shape how rules are built and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacerOptions {
    /// Bound on document-in-scalar nesting for field paths.
    pub max_depth: usize,
    /// Path used for `objref` sources without a `fieldref`.
    pub default_fieldref: String,
}

impl Default for ReplacerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            default_fieldref: DEFAULT_FIELDREF.to_string(),
        }
    }
}

/// One field of one resource, picked by selector.
#[derive(Debug, Clone)]
pub struct FieldRef {
    pub matcher: ResourceMatcher,
    pub path: FieldPath,
}

#[derive(Debug, Clone)]
pub enum Source {
    Literal(String),
    SingleRef(FieldRef),
    MultiRef { refs: Vec<FieldRef>, template: String },
}

/// A target path, optionally narrowed to the part matching `scope`.
#[derive(Debug, Clone)]
pub struct TargetField {
    pub path: FieldPath,
    pub scope: Option<Regex>,
}

#[derive(Debug, Clone)]
pub struct Target {
    pub matcher: ResourceMatcher,
    pub fields: Vec<TargetField>,
}

#[derive(Debug, Clone)]
pub struct Replacement {
    pub source: Source,
    pub target: Target,
}

impl Replacement {
    /// Validates one rule from the rule file.
    pub fn from_spec(
        rule: usize,
        spec: &ReplacementSpec,
        options: &ReplacerOptions,
    ) -> Result<Self, ReplacementError> {
        let source = spec
            .source
            .as_ref()
            .ok_or(ReplacementError::MissingSource { rule })?;
        let target = spec
            .target
            .as_ref()
            .ok_or(ReplacementError::MissingTarget { rule })?;

        Ok(Self {
            source: build_source(rule, source, options)?,
            target: build_target(rule, target)?,
        })
    }
}

fn build_source(
    rule: usize,
    spec: &SourceSpec,
    options: &ReplacerOptions,
) -> Result<Source, ReplacementError> {
    if spec.fieldref.is_some() && spec.objref.is_none() {
        return Err(ReplacementError::FieldRefWithoutObjRef { rule });
    }

    match (&spec.value, &spec.objref, &spec.multiref) {
        (Some(value), None, None) => Ok(Source::Literal(value.clone())),
        (None, Some(objref), None) => Ok(Source::SingleRef(build_field_ref(
            rule,
            objref,
            spec.fieldref.as_deref(),
            options,
        )?)),
        (None, None, Some(multiref)) => {
            let refs = multiref
                .refs
                .iter()
                .enumerate()
                .map(|(index, r)| {
                    let objref = r
                        .objref
                        .as_ref()
                        .ok_or(ReplacementError::MultiRefMissingObjRef { rule, index })?;
                    build_field_ref(rule, objref, r.fieldref.as_deref(), options)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Source::MultiRef {
                refs,
                template: multiref.template.clone(),
            })
        }
        (value, objref, multiref) => Err(ReplacementError::SourceVariants {
            rule,
            count: [value.is_some(), objref.is_some(), multiref.is_some()]
                .iter()
                .filter(|set| **set)
                .count(),
        }),
    }
}

fn build_field_ref(
    rule: usize,
    objref: &Selector,
    fieldref: Option<&str>,
    options: &ReplacerOptions,
) -> Result<FieldRef, ReplacementError> {
    let raw = fieldref
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(options.default_fieldref.as_str());
    Ok(FieldRef {
        matcher: compile_selector(rule, objref)?,
        path: parse_path(rule, raw)?,
    })
}

fn build_target(rule: usize, spec: &TargetSpec) -> Result<Target, ReplacementError> {
    let objref = spec
        .objref
        .as_ref()
        .ok_or(ReplacementError::MissingTargetSelector { rule })?;
    let fields = spec
        .fieldrefs
        .iter()
        .map(|raw| {
            let (base, pattern) = split_substring_scope(raw.trim());
            let scope = pattern
                .map(|p| {
                    Regex::new(p).map_err(|source| ReplacementError::InvalidScope {
                        rule,
                        pattern: p.to_string(),
                        source,
                    })
                })
                .transpose()?;
            Ok(TargetField {
                path: parse_path(rule, base)?,
                scope,
            })
        })
        .collect::<Result<Vec<_>, ReplacementError>>()?;

    Ok(Target {
        matcher: compile_selector(rule, objref)?,
        fields,
    })
}

fn compile_selector(rule: usize, selector: &Selector) -> Result<ResourceMatcher, ReplacementError> {
    ResourceMatcher::compile(selector)
        .map_err(|source| ReplacementError::InvalidSelector { rule, source })
}

fn parse_path(rule: usize, raw: &str) -> Result<FieldPath, ReplacementError> {
    Parser::parse(raw).map_err(|source| ReplacementError::InvalidPath {
        rule,
        path: raw.to_string(),
        source,
    })
}

/// A validated rule set, ready to run against resource collections.
pub struct Replacer {
    replacements: Vec<Replacement>,
    evaluator: Evaluator,
    mutator: Mutator,
    renderer: Box<dyn TemplateRenderer>,
}

impl std::fmt::Debug for Replacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replacer")
            .field("replacements", &self.replacements)
            .field("evaluator", &self.evaluator)
            .field("mutator", &self.mutator)
            .finish_non_exhaustive()
    }
}

impl Replacer {
    /// Validates `config` with default options.
    pub fn new(config: &ReplacementConfig) -> Result<Self, ReplacementError> {
        Self::with_options(config, &ReplacerOptions::default())
    }

    pub fn with_options(
        config: &ReplacementConfig,
        options: &ReplacerOptions,
    ) -> Result<Self, ReplacementError> {
        let replacements = config
            .replacements
            .iter()
            .enumerate()
            .map(|(rule, spec)| Replacement::from_spec(rule, spec, options))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            replacements,
            evaluator: Evaluator::with_max_depth(options.max_depth),
            mutator: Mutator::with_max_depth(options.max_depth),
            renderer: Box::new(PositionalTemplate),
        })
    }

    /// Replaces the renderer used for multiref templates.
    pub fn with_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    /// Applies every rule in order, mutating `resources` in place.
    ///
    /// On error the collection keeps whatever earlier rules already wrote.
    pub fn execute(&self, resources: &mut [Resource]) -> Result<(), ReplacementError> {
        for (rule, replacement) in self.replacements.iter().enumerate() {
            let value = self.resolve_source(rule, &replacement.source, resources)?;
            let written = self.apply(rule, &replacement.target, resources, &value)?;
            info!(rule, fields = written, "Applied replacement");
        }
        Ok(())
    }

    fn resolve_source(
        &self,
        rule: usize,
        source: &Source,
        resources: &[Resource],
    ) -> Result<YamlNode, ReplacementError> {
        match source {
            Source::Literal(value) => Ok(YamlNode::string(value.as_str())),
            Source::SingleRef(field) => self.resolve_field(rule, field, resources),
            Source::MultiRef { refs, template } => {
                let mut values = Vec::with_capacity(refs.len());
                for (index, field) in refs.iter().enumerate() {
                    let node = self.resolve_field(rule, field, resources)?;
                    let text = match node.kind() {
                        NodeKind::Scalar => node.as_scalar_text(),
                        _ => None,
                    }
                    .ok_or_else(|| ReplacementError::MultiRefNotScalar {
                        rule,
                        index,
                        path: field.path.to_string(),
                    })?;
                    values.push(text);
                }
                let rendered = self
                    .renderer
                    .render(template, &values)
                    .map_err(|source| ReplacementError::Template { rule, source })?;
                debug!(rule, template = %template, value = %rendered, "Rendered multiref template");
                Ok(YamlNode::string(rendered))
            }
        }
    }

    fn resolve_field(
        &self,
        rule: usize,
        field: &FieldRef,
        resources: &[Resource],
    ) -> Result<YamlNode, ReplacementError> {
        let index = field
            .matcher
            .find_one(resources)
            .map_err(|source| ReplacementError::Selection { rule, source })?;
        let resource = &resources[index];
        let node = self
            .evaluator
            .get(resource.root(), &field.path)
            .map_err(|source| ReplacementError::Field {
                rule,
                path: field.path.to_string(),
                resource: resource.to_string(),
                source,
            })?;
        debug!(rule, resource = %resource, path = %field.path, kind = %node.kind(), "Resolved source value");
        Ok(node)
    }

    /// Writes `value` into every target field of every matching resource.
    /// Returns the number of fields written.
    fn apply(
        &self,
        rule: usize,
        target: &Target,
        resources: &mut [Resource],
        value: &YamlNode,
    ) -> Result<usize, ReplacementError> {
        let indices = target
            .matcher
            .filter_indices(resources)
            .map_err(|source| ReplacementError::Selection { rule, source })?;
        if indices.is_empty() {
            warn!(rule, selector = %target.matcher, "No resources match target");
        }

        let mut written = 0;
        for index in indices {
            let resource = &mut resources[index];
            let label = resource.to_string();
            for field in &target.fields {
                let new_value = match &field.scope {
                    Some(scope) => self.scoped_value(rule, resource, field, scope, value, &label)?,
                    None => value.clone(),
                };
                self.mutator
                    .set(resource.root_mut(), &field.path, new_value)
                    .map_err(|source| ReplacementError::Field {
                        rule,
                        path: field.path.to_string(),
                        resource: label.clone(),
                        source,
                    })?;
                debug!(rule, resource = %label, path = %field.path, "Wrote field");
                written += 1;
            }
        }
        Ok(written)
    }

    /// Splices `value` into the current target value wherever `scope` matches.
    fn scoped_value(
        &self,
        rule: usize,
        resource: &Resource,
        field: &TargetField,
        scope: &Regex,
        value: &YamlNode,
        label: &str,
    ) -> Result<YamlNode, ReplacementError> {
        let current = self
            .evaluator
            .get(resource.root(), &field.path)
            .map_err(|source| ReplacementError::Field {
                rule,
                path: field.path.to_string(),
                resource: label.to_string(),
                source,
            })?;
        let not_scalar = || ReplacementError::ScopeNotScalar {
            rule,
            path: field.path.to_string(),
            resource: label.to_string(),
        };
        if current.kind() != NodeKind::Scalar || value.kind() != NodeKind::Scalar {
            return Err(not_scalar());
        }
        let current = current.as_scalar_text().ok_or_else(not_scalar)?;
        let replacement = value.as_scalar_text().ok_or_else(not_scalar)?;

        if !scope.is_match(&current) {
            return Err(ReplacementError::ScopeNoMatch {
                rule,
                pattern: scope.as_str().to_string(),
                value: current,
                path: field.path.to_string(),
                resource: label.to_string(),
            });
        }
        Ok(YamlNode::string(
            scope.replace_all(&current, replacement.as_str()).into_owned(),
        ))
    }
}
