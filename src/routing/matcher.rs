//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Extract `:name` parameters from a route pattern
//! - Compile parameterized patterns into an anchored regex once, at registration
//! - Match request paths and bind captures to parameter names by position
//!
//! # Design Decisions
//! - A parameter accepts `[a-zA-Z0-9]+` only, so it never crosses a `/`
//! - Literal text between parameters is escaped before compilation
//! - Patterns without parameters get no matcher; they only match exactly

use regex::Regex;
use std::collections::HashMap;

use crate::routing::RouteError;

const PARAM_SIGIL: char = ':';
const PARAM_CAPTURE: &str = "([a-zA-Z0-9]+)";

/// A piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
}

/// Split a pattern into literal runs and `:name` parameters.
///
/// A parameter name is the longest run of word characters after the sigil.
/// A sigil followed by no word character stays literal.
fn segments(pattern: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut chars = pattern.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch != PARAM_SIGIL {
            continue;
        }
        let name_start = idx + ch.len_utf8();
        let mut name_end = name_start;
        while let Some(&(next_idx, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                name_end = next_idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        if name_end == name_start {
            continue;
        }
        if literal_start < idx {
            out.push(Segment::Literal(&pattern[literal_start..idx]));
        }
        out.push(Segment::Param(&pattern[name_start..name_end]));
        literal_start = name_end;
    }

    if literal_start < pattern.len() {
        out.push(Segment::Literal(&pattern[literal_start..]));
    }
    out
}

/// Parameter names of a pattern, in order of appearance.
pub fn param_names(pattern: &str) -> Vec<String> {
    segments(pattern)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Param(name) => Some(name.to_string()),
            Segment::Literal(_) => None,
        })
        .collect()
}

/// Pattern with every parameter name erased.
///
/// `/users/:id` and `/users/:name` share a shape; two routes with the same
/// shape and method would be indistinguishable during resolution.
pub fn shape(pattern: &str) -> String {
    segments(pattern)
        .into_iter()
        .map(|s| match s {
            Segment::Literal(text) => text,
            Segment::Param(_) => ":",
        })
        .collect()
}

/// A compiled parameterized pattern.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
    params: Vec<String>,
}

impl PathMatcher {
    /// Compile `pattern`. Returns `Ok(None)` when the pattern has no parameters.
    pub fn compile(pattern: &str) -> Result<Option<Self>, RouteError> {
        let parts = segments(pattern);
        if !parts.iter().any(|s| matches!(s, Segment::Param(_))) {
            return Ok(None);
        }

        let mut source = String::with_capacity(pattern.len() + 16);
        let mut params: Vec<String> = Vec::new();
        source.push('^');
        for part in parts {
            match part {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Param(name) => {
                    if params.iter().any(|p| p == name) {
                        return Err(RouteError::DuplicateParam {
                            path: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    params.push(name.to_string());
                    source.push_str(PARAM_CAPTURE);
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| RouteError::InvalidPattern {
            path: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Some(Self { regex, params }))
    }

    /// Match `path`, returning the bound parameters on success.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let bound = self
            .params
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                caps.get(i + 1)
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();
        Some(bound)
    }

    /// Parameter names in capture order.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}
