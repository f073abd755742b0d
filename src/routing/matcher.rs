//! Path matching strategies.
//!
//! # Responsibilities
//! - Exact string matching
//! - Segment-tree patterns (`/api/{id}`, `/files/{*rest}`)
//! - Legacy Ant-style wildcard patterns (`/api/*/x`, `/static/**`, `/a?c`)
//!
//! # Design Decisions
//! - A route carries exactly one strategy, modelled as a tagged enum
//! - Path matching is case-sensitive
//! - Segment patterns are matched segment by segment, no regex
//! - Segment patterns accept one optional trailing `/` on the request path
//! - Ant patterns compile to `globset` matchers with literal separators,
//!   so `*` never crosses a `/`

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};
use serde::Serialize;
use thiserror::Error;

/// Trait for matching a request path against a compiled pattern.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if the path matches this pattern.
    fn matches(&self, path: &str) -> bool;
}

/// Errors raised while compiling a route pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("invalid segment '{segment}' in pattern '{pattern}'")]
    InvalidSegment { pattern: String, segment: String },

    #[error("catch-all must be the last segment in pattern '{0}'")]
    MisplacedCatchAll(String),

    #[error("invalid wildcard pattern: {0}")]
    Glob(#[from] globset::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
    Wildcard,
    CatchAll,
}

/// A segment-tree style pattern.
#[derive(Debug, Clone)]
pub struct SegmentPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl SegmentPattern {
    /// Parse a segment pattern such as `/users/{id}/posts/{*rest}`.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }

        let parts = split_segments(raw);
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = parse_segment(raw, part)?;
            if segment == Segment::CatchAll && i + 1 != parts.len() {
                return Err(PatternError::MisplacedCatchAll(raw.to_string()));
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the `{name}` captures, in order.
    pub fn captures(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Capture(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn parse_segment(pattern: &str, part: &str) -> Result<Segment, PatternError> {
    let invalid = || PatternError::InvalidSegment {
        pattern: pattern.to_string(),
        segment: part.to_string(),
    };

    if part == "**" {
        return Ok(Segment::CatchAll);
    }
    if part == "*" {
        return Ok(Segment::Wildcard);
    }
    if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
        if let Some(name) = inner.strip_prefix('*') {
            if name.is_empty() {
                return Err(invalid());
            }
            return Ok(Segment::CatchAll);
        }
        if inner.is_empty() || inner.contains(['{', '}']) {
            return Err(invalid());
        }
        return Ok(Segment::Capture(inner.to_string()));
    }
    if part.contains(['{', '}', '*']) {
        return Err(invalid());
    }
    Ok(Segment::Literal(part.to_string()))
}

fn split_segments(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

impl Matcher for SegmentPattern {
    fn matches(&self, path: &str) -> bool {
        if !path.starts_with('/') {
            return false;
        }
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };
        let parts = split_segments(path);

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::CatchAll => return true,
                Segment::Literal(lit) => {
                    if parts.get(i) != Some(&lit.as_str()) {
                        return false;
                    }
                }
                Segment::Capture(_) | Segment::Wildcard => match parts.get(i) {
                    Some(part) if !part.is_empty() => {}
                    _ => return false,
                },
            }
        }

        parts.len() == self.segments.len()
    }
}

/// A legacy Ant-style wildcard pattern.
#[derive(Debug, Clone)]
pub struct AntPattern {
    raw: String,
    matcher: GlobMatcher,
}

impl AntPattern {
    /// Compile an Ant-style pattern. `{name}` variables match one segment.
    pub fn compile(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }

        let glob = GlobBuilder::new(&translate_ant(raw))
            .literal_separator(true)
            .build()?;

        Ok(Self {
            raw: raw.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Rewrites Ant syntax into globset syntax: `{var}` becomes `*`, and
/// brackets are escaped since Ant has no character classes.
fn translate_ant(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_var = false;
    for c in raw.chars() {
        match c {
            '{' if !in_var => {
                in_var = true;
                out.push('*');
            }
            '}' if in_var => in_var = false,
            _ if in_var => {}
            '[' => out.push_str("[[]"),
            ']' => out.push_str("[]]"),
            _ => out.push(c),
        }
    }
    out
}

impl Matcher for AntPattern {
    fn matches(&self, path: &str) -> bool {
        if self.matcher.is_match(path) {
            return true;
        }
        // Ant treats `/base/**` as matching `/base` itself.
        self.raw
            .strip_suffix("/**")
            .is_some_and(|base| base == path)
    }
}

/// The matching strategy a route was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Exact,
    Glob,
    Tree,
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatcherKind::Exact => "exact",
            MatcherKind::Glob => "glob",
            MatcherKind::Tree => "tree",
        };
        f.write_str(name)
    }
}

/// A compiled route pattern tagged with its strategy.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    Exact(String),
    Glob(AntPattern),
    Tree(SegmentPattern),
}

impl PathMatcher {
    pub fn exact(pattern: impl Into<String>) -> Self {
        PathMatcher::Exact(pattern.into())
    }

    pub fn glob(pattern: &str) -> Result<Self, PatternError> {
        AntPattern::compile(pattern).map(PathMatcher::Glob)
    }

    pub fn tree(pattern: &str) -> Result<Self, PatternError> {
        SegmentPattern::parse(pattern).map(PathMatcher::Tree)
    }

    /// Compile `pattern` with the given strategy.
    pub fn compile(kind: MatcherKind, pattern: &str) -> Result<Self, PatternError> {
        match kind {
            MatcherKind::Exact => Ok(Self::exact(pattern)),
            MatcherKind::Glob => Self::glob(pattern),
            MatcherKind::Tree => Self::tree(pattern),
        }
    }

    /// The raw pattern string as declared.
    pub fn pattern(&self) -> &str {
        match self {
            PathMatcher::Exact(p) => p,
            PathMatcher::Glob(p) => p.as_str(),
            PathMatcher::Tree(p) => p.as_str(),
        }
    }

    pub fn kind(&self) -> MatcherKind {
        match self {
            PathMatcher::Exact(_) => MatcherKind::Exact,
            PathMatcher::Glob(_) => MatcherKind::Glob,
            PathMatcher::Tree(_) => MatcherKind::Tree,
        }
    }

    /// Recompile a different pattern with the same strategy.
    pub fn with_pattern(&self, pattern: &str) -> Result<Self, PatternError> {
        Self::compile(self.kind(), pattern)
    }

    /// Exact string comparison against the raw pattern, whatever the strategy.
    pub fn pattern_equals(&self, path: &str) -> bool {
        self.pattern() == path
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(p) => p == path,
            PathMatcher::Glob(p) => p.matches(path),
            PathMatcher::Tree(p) => p.matches(path),
        }
    }
}
