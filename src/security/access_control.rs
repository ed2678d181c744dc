//! Path-based access control.
//!
//! # Responsibilities
//! - Compile the optional allow/deny patterns once at startup
//! - Decide per request path: Forbidden, NotFound or Allowed
//!
//! # Design Decisions
//! - Deny wins over allow
//! - An unset pattern constrains nothing
//! - Patterns are unanchored regex searches; anchor with `^` explicitly
//! - Immutable after construction, shared via Arc without locks

use regex::Regex;
use thiserror::Error;

/// Which configured pattern an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Allowed,
    Denied,
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternKind::Allowed => f.write_str("allowed-paths"),
            PatternKind::Denied => f.write_str("denied-paths"),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid {kind} pattern {pattern:?}: {source}")]
pub struct AccessError {
    pub kind: PatternKind,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Outcome of evaluating a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Matched the deny pattern.
    Forbidden,
    /// An allow pattern is set and did not match.
    NotFound,
    Allowed,
}

/// Compiled allow/deny rules.
#[derive(Debug, Clone, Default)]
pub struct AccessFilter {
    allow: Option<Regex>,
    deny: Option<Regex>,
}

impl AccessFilter {
    /// Filter that allows every path.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Compile the given patterns. Empty strings count as unset.
    pub fn compile(allow: Option<&str>, deny: Option<&str>) -> Result<Self, AccessError> {
        Ok(Self {
            allow: compile_pattern(allow, PatternKind::Allowed)?,
            deny: compile_pattern(deny, PatternKind::Denied)?,
        })
    }

    /// Evaluate `path` against the rules.
    pub fn permits(&self, path: &str) -> Decision {
        if self.deny.as_ref().is_some_and(|re| re.is_match(path)) {
            return Decision::Forbidden;
        }
        if self.allow.as_ref().is_some_and(|re| !re.is_match(path)) {
            return Decision::NotFound;
        }
        Decision::Allowed
    }

    /// True when no pattern is configured.
    pub fn is_unrestricted(&self) -> bool {
        self.allow.is_none() && self.deny.is_none()
    }
}

fn compile_pattern(pattern: Option<&str>, kind: PatternKind) -> Result<Option<Regex>, AccessError> {
    match pattern.filter(|p| !p.is_empty()) {
        None => Ok(None),
        Some(p) => Regex::new(p).map(Some).map_err(|source| AccessError {
            kind,
            pattern: p.to_string(),
            source,
        }),
    }
}
