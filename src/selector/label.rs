//! Label-expression selectors.
//!
//! Supports the Kubernetes label-selector syntax: a comma-separated list of
//! requirements that must all hold.
//!
//! - `key` / `!key` - label present / absent
//! - `key=value`, `key==value` - label present with that value
//! - `key!=value` - label absent or with another value
//! - `key in (a,b)` - label present with one of the values
//! - `key notin (a,b)` - label absent or with none of the values
//!
//! # Example
//!
//! ```
//! use yamlreplace::selector::label::{parse_label_set, LabelSelector};
//!
//! let selector = LabelSelector::parse("x in (r), z in (xxx)").unwrap();
//! assert!(selector.matches(&parse_label_set("x=r,z=xxx").unwrap()));
//! assert!(!selector.matches(&parse_label_set("x=y,z=a").unwrap()));
//! ```

use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use super::error::SelectorError;

static EXISTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(!?)\s*([A-Za-z0-9][-A-Za-z0-9_./]*)$").expect("valid regex")
});
static EQUALITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_./]*)\s*(==|!=|=)\s*([-A-Za-z0-9_.]*)$")
        .expect("valid regex")
});
static SET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_./]*)\s+(in|notin)\s*\(([^()]*)\)$")
        .expect("valid regex")
});
static VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-A-Za-z0-9_.]*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Exists,
    DoesNotExist,
    Equals,
    NotEquals,
    In,
    NotIn,
}

/// One condition of a label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    pub values: Vec<String>,
}

impl Requirement {
    pub fn matches(&self, labels: &IndexMap<String, String>) -> bool {
        let actual = labels.get(&self.key);
        let listed = |value: &String| self.values.iter().any(|v| v == value);
        match self.operator {
            Operator::Exists => actual.is_some(),
            Operator::DoesNotExist => actual.is_none(),
            Operator::Equals | Operator::In => actual.is_some_and(listed),
            Operator::NotEquals | Operator::NotIn => !actual.is_some_and(listed),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
            Operator::Equals => write!(f, "{}={}", self.key, self.values.join("")),
            Operator::NotEquals => write!(f, "{}!={}", self.key, self.values.join("")),
            Operator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
        }
    }
}

/// A parsed label selector. The empty selector matches every label set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let invalid = |message: String| SelectorError::InvalidExpression {
            selector: selector.to_string(),
            message,
        };

        let mut requirements = Vec::new();
        for part in split_requirements(selector).map_err(|m| invalid(m.to_string()))? {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let requirement =
                parse_requirement(part).ok_or_else(|| invalid(format!("cannot parse '{}'", part)))?;
            requirements.push(requirement);
        }
        Ok(Self { requirements })
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn matches(&self, labels: &IndexMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, requirement) in self.requirements.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", requirement)?;
        }
        Ok(())
    }
}

/// Splits on commas that are not inside a `( ... )` value list.
fn split_requirements(selector: &str) -> Result<Vec<&str>, &'static str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, ch) in selector.char_indices() {
        match ch {
            '(' => {
                if depth > 0 {
                    return Err("nested '('");
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err("unbalanced ')'");
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                parts.push(&selector[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth > 0 {
        return Err("unclosed '('");
    }
    parts.push(&selector[start..]);
    Ok(parts)
}

fn parse_requirement(part: &str) -> Option<Requirement> {
    if let Some(caps) = SET_RE.captures(part) {
        let operator = if &caps[2] == "in" {
            Operator::In
        } else {
            Operator::NotIn
        };
        let values = caps[3]
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if values.iter().any(|v| !VALUE_RE.is_match(v)) {
            return None;
        }
        return Some(Requirement {
            key: caps[1].to_string(),
            operator,
            values,
        });
    }
    if let Some(caps) = EQUALITY_RE.captures(part) {
        let operator = if &caps[2] == "!=" {
            Operator::NotEquals
        } else {
            Operator::Equals
        };
        return Some(Requirement {
            key: caps[1].to_string(),
            operator,
            values: vec![caps[3].to_string()],
        });
    }
    let caps = EXISTS_RE.captures(part)?;
    let operator = if caps[1].is_empty() {
        Operator::Exists
    } else {
        Operator::DoesNotExist
    };
    Some(Requirement {
        key: caps[2].to_string(),
        operator,
        values: Vec::new(),
    })
}

/// Parses a label set written as `k1=v1,k2=v2`.
///
/// Whitespace around keys and values is ignored; an empty string is the
/// empty set.
pub fn parse_label_set(labels: &str) -> Result<IndexMap<String, String>, SelectorError> {
    let mut set = IndexMap::new();
    for pair in labels.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| SelectorError::InvalidLabelSet {
                labels: labels.to_string(),
                message: format!("'{}' is not a key=value pair", pair),
            })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(SelectorError::InvalidLabelSet {
                labels: labels.to_string(),
                message: format!("empty key in '{}'", pair),
            });
        }
        set.insert(key.to_string(), value.trim().to_string());
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_selector_matches_all() {
        let selector = LabelSelector::parse("").unwrap();
        assert!(selector.is_empty());
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("a", "b")])));
    }

    #[test]
    fn test_equality() {
        let selector = LabelSelector::parse("app=web").unwrap();
        assert!(selector.matches(&labels(&[("app", "web")])));
        assert!(!selector.matches(&labels(&[("app", "db")])));
        assert!(!selector.matches(&labels(&[])));
        assert_eq!(
            LabelSelector::parse("app==web").unwrap(),
            LabelSelector::parse("app = web").unwrap()
        );
    }

    #[test]
    fn test_not_equals_matches_missing() {
        let selector = LabelSelector::parse("tier!=frontend").unwrap();
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("tier", "backend")])));
        assert!(!selector.matches(&labels(&[("tier", "frontend")])));
    }

    #[test]
    fn test_existence() {
        let selector = LabelSelector::parse("app,!canary").unwrap();
        assert!(selector.matches(&labels(&[("app", "x")])));
        assert!(!selector.matches(&labels(&[("app", "x"), ("canary", "true")])));
        assert!(!selector.matches(&labels(&[("canary", "true")])));
    }

    #[test]
    fn test_set_based() {
        let selector = LabelSelector::parse("env in (prod, staging),tier notin (cache)").unwrap();
        assert_eq!(selector.requirements().len(), 2);
        assert!(selector.matches(&labels(&[("env", "prod")])));
        assert!(selector.matches(&labels(&[("env", "staging"), ("tier", "web")])));
        assert!(!selector.matches(&labels(&[("env", "prod"), ("tier", "cache")])));
        assert!(!selector.matches(&labels(&[("env", "dev")])));
    }

    #[test]
    fn test_qualified_keys() {
        let selector = LabelSelector::parse("app.kubernetes.io/name=web").unwrap();
        assert!(selector.matches(&labels(&[("app.kubernetes.io/name", "web")])));
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["env in (prod", "env in prod)", "=x", "a b", "env in ((x))", "k=v=w"] {
            assert!(
                matches!(
                    LabelSelector::parse(bad),
                    Err(SelectorError::InvalidExpression { .. })
                ),
                "{} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_display() {
        let selector = LabelSelector::parse("a, !b, c=d, e in (f,g)").unwrap();
        assert_eq!(selector.to_string(), "a,!b,c=d,e in (f,g)");
    }

    #[test]
    fn test_parse_label_set() {
        let set = parse_label_set("x=y, z=a").unwrap();
        assert_eq!(set, labels(&[("x", "y"), ("z", "a")]));
        assert!(parse_label_set("").unwrap().is_empty());
        assert!(matches!(
            parse_label_set("x"),
            Err(SelectorError::InvalidLabelSet { .. })
        ));
        assert!(parse_label_set("=v").is_err());
    }
}
