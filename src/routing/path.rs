use std::fmt;

use crate::error::{ConfigurationError, MalformedPath};

pub(crate) const WILDCARD: &str = "**";

fn is_pattern_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

fn is_illegal_path_char(c: char) -> bool {
    c.is_control() || c.is_whitespace() || matches!(c, '\\' | '<' | '>' | '"')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Wildcard,
}

/// Pattern
///
/// A compiled route path: literal segments, optionally terminated by `**`.
/// The empty pattern has no segments and matches without consuming anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub(crate) fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.starts_with('/') {
            return Err(invalid("route paths are relative and must not start with '/'"));
        }
        if raw.is_empty() {
            return Ok(Self {
                raw: String::new(),
                segments: Vec::new(),
            });
        }

        let parts: Vec<&str> = raw.split('/').collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());
        for (index, part) in parts.into_iter().enumerate() {
            if part == WILDCARD {
                if index != last {
                    return Err(invalid("'**' is only allowed as the last segment"));
                }
                segments.push(Segment::Wildcard);
            } else if part.is_empty() {
                return Err(invalid("empty segment"));
            } else if !part.chars().all(is_pattern_char) {
                return Err(invalid("segments may only use [A-Za-z0-9-_.~]"));
            } else if part == "." || part == ".." {
                return Err(invalid("dot segments are not routable"));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard))
    }

    /// The catch-all `**` pattern.
    pub(crate) fn is_catch_all(&self) -> bool {
        self.segments.len() == 1 && self.has_wildcard()
    }

    /// How many leading segments of `remaining` this pattern consumes, if it matches them.
    /// A terminal wildcard swallows everything that is left.
    pub(crate) fn match_prefix(&self, remaining: &[String]) -> Option<usize> {
        let mut consumed = 0;
        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return Some(remaining.len()),
                Segment::Literal(literal) => {
                    if remaining.get(consumed) != Some(literal) {
                        return None;
                    }
                    consumed += 1;
                }
            }
        }
        Some(consumed)
    }
}

/// RequestPath
///
/// A requested navigation path after syntactic validation, split into segments.
///
/// Accepted shapes: `home`, `/home`, `admin/dashboard/`, `products?sort=asc`, `/` (the root).
/// Rejected: the empty string, empty interior segments (`a//b`), `.`/`..` segments,
/// whitespace, control characters and `\ < > "`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    segments: Vec<String>,
}

impl RequestPath {
    pub fn parse(raw: &str) -> Result<Self, MalformedPath> {
        let malformed = |diagnostic: &str| MalformedPath {
            path: raw.to_string(),
            diagnostic: diagnostic.to_string(),
        };

        if raw.is_empty() {
            return Err(malformed("empty path"));
        }

        // Query and fragment never take part in matching.
        let path = raw.split(['?', '#']).next().unwrap_or_default();

        if let Some(c) = path.chars().find(|c| is_illegal_path_char(*c)) {
            return Err(malformed(&format!("illegal character {c:?}")));
        }

        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
            });
        }

        let mut segments = Vec::new();
        for part in trimmed.split('/') {
            match part {
                "" => return Err(malformed("empty path segment")),
                "." | ".." => return Err(malformed("dot segments are not allowed")),
                _ => segments.push(part.to_string()),
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Resolves a redirect target against the prefix matched by the redirect's parent.
/// Targets starting with `/` are absolute and ignore the prefix.
pub(crate) fn join_target(base: &[&str], target: &str) -> String {
    let relative = target.trim_matches('/');
    if target.starts_with('/') || base.is_empty() {
        return relative.to_string();
    }
    if relative.is_empty() {
        return base.join("/");
    }
    format!("{}/{}", base.join("/"), relative)
}
