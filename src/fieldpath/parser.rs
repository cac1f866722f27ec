//! Field path parser.
//!
//! A path is a list of spans separated by `|`; each span is a list of
//! segments separated by `.`. A bracketed group is always one segment, so
//! dots inside a predicate value do not split it:
//!
//! ```
//! use yamlreplace::fieldpath::{Parser, PathSegment};
//!
//! let path = Parser::parse("a.b[name=x.y].c").unwrap();
//! assert_eq!(path.spans()[0].segments[2], PathSegment::Predicate {
//!     key: "name".to_string(),
//!     value: "x.y".to_string(),
//! });
//! ```

use super::ast::{FieldPath, PathSegment, PathSpan};
use super::error::FieldPathError;

/// Parser for field path strings.
pub struct Parser<'a> {
    path: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given path string.
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            chars: path.chars().collect(),
            position: 0,
        }
    }

    /// Parses a path string into a compiled `FieldPath`.
    pub fn parse(path: &str) -> Result<FieldPath, FieldPathError> {
        let spans = Self::parse_spans(path)?;
        Ok(FieldPath::new(spans, path))
    }

    /// Parses a path string into its `|`-separated spans.
    pub fn parse_spans(path: &str) -> Result<Vec<PathSpan>, FieldPathError> {
        Parser::new(path).parse_path()
    }

    /// Parses a single span (no `|` allowed) into its segments.
    pub fn parse_segments(span: &str) -> Result<Vec<PathSegment>, FieldPathError> {
        let mut spans = Self::parse_spans(span)?;
        if spans.len() > 1 {
            return Err(FieldPathError::InvalidSegment {
                path: span.to_string(),
                segment: span.to_string(),
                message: "a single span cannot contain '|'".to_string(),
            });
        }
        Ok(spans.remove(0).segments)
    }

    fn parse_path(&mut self) -> Result<Vec<PathSpan>, FieldPathError> {
        let mut spans = Vec::new();
        let mut segments = Vec::new();
        let mut key = String::new();

        while let Some(ch) = self.next() {
            match ch {
                '\\' => match self.next() {
                    Some(escaped) => key.push(escaped),
                    None => {
                        return Err(self.invalid_segment(&key, "dangling escape at end of path"))
                    }
                },
                '.' => Self::flush_key(&mut key, &mut segments),
                '|' => {
                    Self::flush_key(&mut key, &mut segments);
                    if segments.is_empty() {
                        return Err(self.invalid_segment("|", "empty span before '|'"));
                    }
                    spans.push(PathSpan::new(std::mem::take(&mut segments)));
                }
                '[' => {
                    Self::flush_key(&mut key, &mut segments);
                    let start = self.position - 1;
                    let body = self.read_bracket(start)?;
                    segments.push(self.parse_bracket(&body)?);
                    match self.peek() {
                        None | Some('.') | Some('|') | Some('[') => {}
                        Some(found) => {
                            return Err(FieldPathError::UnexpectedChar {
                                path: self.path.to_string(),
                                position: self.position,
                                found,
                            })
                        }
                    }
                }
                ']' => {
                    return Err(FieldPathError::UnexpectedChar {
                        path: self.path.to_string(),
                        position: self.position - 1,
                        found: ']',
                    })
                }
                other => key.push(other),
            }
        }

        Self::flush_key(&mut key, &mut segments);
        if segments.is_empty() {
            if spans.is_empty() {
                return Err(FieldPathError::Empty);
            }
            return Err(self.invalid_segment("|", "empty span after '|'"));
        }
        spans.push(PathSpan::new(segments));
        Ok(spans)
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    /// Returns the next character and advances position.
    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    /// Pushes a pending key segment. Empty keys (leading or doubled dots)
    /// are dropped.
    fn flush_key(key: &mut String, segments: &mut Vec<PathSegment>) {
        if !key.is_empty() {
            segments.push(PathSegment::Key(std::mem::take(key)));
        }
    }

    /// Reads up to the closing `]`, returning the bracket body.
    fn read_bracket(&mut self, start: usize) -> Result<String, FieldPathError> {
        let mut body = String::new();
        loop {
            match self.next() {
                Some(']') => return Ok(body),
                Some(ch) => body.push(ch),
                None => {
                    return Err(FieldPathError::UnclosedBracket {
                        path: self.path.to_string(),
                        position: start,
                    })
                }
            }
        }
    }

    /// Parses bracket body: `N` is an index, `key=value` a predicate.
    fn parse_bracket(&self, body: &str) -> Result<PathSegment, FieldPathError> {
        let segment = format!("[{}]", body);
        if body.is_empty() {
            return Err(self.invalid_segment(&segment, "empty brackets"));
        }
        if body.chars().all(|c| c.is_ascii_digit()) {
            return body
                .parse::<usize>()
                .map(PathSegment::Index)
                .map_err(|_| self.invalid_segment(&segment, "index out of range"));
        }
        match body.split_once('=') {
            Some((key, value)) => Ok(PathSegment::Predicate {
                key: key.to_string(),
                value: value.to_string(),
            }),
            None => Err(self.invalid_segment(&segment, "expected an index or a key=value predicate")),
        }
    }

    fn invalid_segment(&self, segment: &str, message: &str) -> FieldPathError {
        FieldPathError::InvalidSegment {
            path: self.path.to_string(),
            segment: segment.to_string(),
            message: message.to_string(),
        }
    }
}

/// Splits a trailing substring scope off a target path.
///
/// `image%TAG%` yields `("image", Some("TAG"))`; a path without a
/// well-formed `%pattern%` suffix is returned unchanged.
pub fn split_substring_scope(path: &str) -> (&str, Option<&str>) {
    let Some(body) = path.strip_suffix('%') else {
        return (path, None);
    };
    let Some(split) = body.rfind('%') else {
        return (path, None);
    };
    let (base, pattern) = (&body[..split], &body[split + 1..]);
    let has_space = |s: &str| s.chars().any(char::is_whitespace);
    if base.is_empty() || pattern.is_empty() || has_space(base) || has_space(pattern) {
        return (path, None);
    }
    (base, Some(pattern))
}
