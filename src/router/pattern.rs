//! Path pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse pattern text into literal and named-parameter segments
//! - Validate parameter names and segment shape at registration time
//! - Compare a concrete request path against a parsed pattern
//!
//! # Design Decisions
//! - Patterns and request paths are split identically, so matching is a
//!   straight segment-by-segment walk with no backtracking
//! - Literal segments compare case-sensitively; parameters bind any
//!   non-empty segment
//! - Empty interior segments (from `//`) are rejected at registration;
//!   a single trailing empty segment is what a trailing slash looks like
//!   after splitting, so `/` and `/foo/` stay registrable

use super::router::{Params, RouteError};

/// One segment of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matched by exact, case-sensitive string equality.
    Literal(String),
    /// Matches any non-empty segment and binds it under the given name.
    Param(String),
}

/// A parsed, immutable path pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse pattern text into segments, validating it for registration.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let Some(rest) = raw.strip_prefix('/') else {
            return Err(invalid("must begin with '/'"));
        };

        let parts: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut names: Vec<&str> = Vec::new();

        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                // Only the trailing empty segment produced by "/" or a
                // trailing slash is legal; "//" anywhere else is not.
                if i + 1 != parts.len() {
                    return Err(invalid("empty segment"));
                }
                segments.push(Segment::Literal(String::new()));
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter segment with empty name"));
                }
                if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid("parameter names may only contain [A-Za-z0-9_]"));
                }
                if names.contains(&name) {
                    return Err(invalid("duplicate parameter name"));
                }
                names.push(name);
                segments.push(Segment::Param(name.to_string()));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern text as registered.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Split a request path the same way patterns are split.
    ///
    /// Returns `None` for paths missing the leading '/'; such paths can
    /// never match a registered pattern.
    pub(crate) fn split_path(path: &str) -> Option<Vec<&str>> {
        path.strip_prefix('/').map(|rest| rest.split('/').collect())
    }

    /// Whether the pattern's shape matches the split path.
    pub(crate) fn matches(&self, segments: &[&str]) -> bool {
        if segments.len() != self.segments.len() {
            return false;
        }
        self.segments.iter().zip(segments).all(|(expected, value)| match expected {
            Segment::Literal(lit) => lit.as_str() == *value,
            Segment::Param(_) => !value.is_empty(),
        })
    }

    /// Match the split path and extract parameter bindings.
    pub(crate) fn capture(&self, segments: &[&str]) -> Option<Params> {
        if segments.len() != self.segments.len() {
            return None;
        }
        let mut params = Params::default();
        for (expected, value) in self.segments.iter().zip(segments) {
            match expected {
                Segment::Literal(lit) => {
                    if lit.as_str() != *value {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if value.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), (*value).to_string());
                }
            }
        }
        Some(params)
    }
}
