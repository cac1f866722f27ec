//! Rendering multi-reference templates.
//!
//! A multiref source resolves each of its references to a string and hands
//! the ordered list to a [`TemplateRenderer`]. The bundled
//! [`PositionalTemplate`] substitutes `{{0}}`, `{{1}}`, ... and also accepts
//! the `{{ index .Values N }}` spelling used by existing rule files.
//!
//! # Example
//!
//! ```
//! use yamlreplace::replacement::{PositionalTemplate, TemplateRenderer};
//!
//! let values = vec!["imagevalue".to_string(), "tagvalue".to_string()];
//! let out = PositionalTemplate.render("{{0}}:{{ index .Values 1 }}", &values).unwrap();
//! assert_eq!(out, "imagevalue:tagvalue");
//! ```

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid regex"));
static POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:index\s+\.Values\s+)?(\d+)\s*$").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unsupported template action '{{{{{action}}}}}' in '{template}'")]
    UnsupportedAction { template: String, action: String },

    #[error("unclosed '{{{{' in template '{template}'")]
    Unclosed { template: String },

    #[error("template refers to value {index} but only {len} values were resolved")]
    MissingValue { index: usize, len: usize },
}

/// Turns a template plus positional values into the final source string.
pub trait TemplateRenderer {
    fn render(&self, template: &str, values: &[String]) -> Result<String, TemplateError>;
}

/// Positional `{{N}}` substitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalTemplate;

impl TemplateRenderer for PositionalTemplate {
    fn render(&self, template: &str, values: &[String]) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in ACTION_RE.captures_iter(template) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&template[last..whole.start()]);
            last = whole.end();

            let index = POSITION_RE
                .captures(body.as_str())
                .and_then(|c| c[1].parse::<usize>().ok())
                .ok_or_else(|| TemplateError::UnsupportedAction {
                    template: template.to_string(),
                    action: body.as_str().to_string(),
                })?;
            let value = values.get(index).ok_or(TemplateError::MissingValue {
                index,
                len: values.len(),
            })?;
            out.push_str(value);
        }

        let rest = &template[last..];
        if rest.contains("{{") {
            return Err(TemplateError::Unclosed {
                template: template.to_string(),
            });
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl<F> TemplateRenderer for F
where
    F: Fn(&str, &[String]) -> Result<String, TemplateError>,
{
    fn render(&self, template: &str, values: &[String]) -> Result<String, TemplateError> {
        self(template, values)
    }
}
