//! Backend target resolution.
//!
//! # Responsibilities
//! - Accept a loosely formatted backend spec (`3000`, `host:port`, full URL)
//! - Normalize it into a canonical [`ResolvedTarget`]
//! - Reject schemes, credentials and fragments the proxy cannot honour
//!
//! # Design Decisions
//! - Pure function, no I/O (no DNS lookups)
//! - `https+insecure` is a distinct [`Scheme`] variant, never a string check
//! - Two port policies: lenient (active proxy) and strict (declarative forward)

use std::fmt;
use thiserror::Error;
use url::Url;

/// Host used when the backend spec is a bare port number.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Errors produced while resolving a backend spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("backend spec is empty")]
    Empty,

    #[error("invalid backend target {spec:?}: {reason}")]
    Invalid { spec: String, reason: String },

    #[error("unsupported scheme {0:?}: must be a URL starting with http://, https://, or https+insecure://")]
    UnsupportedScheme(String),

    #[error("invalid port in backend target {0:?}: must be in 1-65535")]
    InvalidPort(String),

    #[error("backend target {0:?} has no port and none can be derived from its scheme")]
    MissingPort(String),

    #[error("backend target {0:?} must not carry credentials")]
    Credentials(String),

    #[error("backend target {0:?} must not carry a fragment")]
    Fragment(String),
}

/// Upstream scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    /// HTTPS upstream whose certificate is not verified.
    HttpsInsecure,
}

impl Scheme {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            "https+insecure" => Some(Scheme::HttpsInsecure),
            _ => None,
        }
    }

    /// Scheme as written in a backend spec.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::HttpsInsecure => "https+insecure",
        }
    }

    /// Scheme handed to the transport. `https+insecure` speaks plain `https`.
    pub fn transport_scheme(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https | Scheme::HttpsInsecure => "https",
        }
    }

    /// Standard port for the scheme.
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https | Scheme::HttpsInsecure => 443,
        }
    }

    /// Whether certificate verification must be skipped.
    pub fn insecure_skip_verify(&self) -> bool {
        matches!(self, Scheme::HttpsInsecure)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to treat a target without an explicit port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortPolicy {
    /// Fall back to the scheme's standard port.
    Lenient,
    /// Only accept defaults the URL layer itself knows (`http`, `https`).
    Strict,
}

/// Canonical upstream descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub scheme: Scheme,
    /// Host as it appears in a URL (IPv6 literals keep their brackets).
    pub host: String,
    pub port: u16,
    /// Base path without trailing slash, `""` for root.
    pub path: String,
    pub query: Option<String>,
}

impl ResolvedTarget {
    /// `host:port`, suitable for a URI authority or a `Host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn insecure_skip_verify(&self) -> bool {
        self.scheme.insecure_skip_verify()
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme, self.host, self.port, self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

/// Resolve a backend spec, defaulting a missing port from the scheme.
pub fn resolve(spec: &str) -> Result<ResolvedTarget, TargetError> {
    resolve_with(spec, PortPolicy::Lenient)
}

/// Resolve a backend spec, refusing ports the URL layer cannot derive.
pub fn resolve_strict(spec: &str) -> Result<ResolvedTarget, TargetError> {
    resolve_with(spec, PortPolicy::Strict)
}

/// Resolve a backend spec under the given port policy.
pub fn resolve_with(spec: &str, policy: PortPolicy) -> Result<ResolvedTarget, TargetError> {
    if spec.is_empty() {
        return Err(TargetError::Empty);
    }

    let source = if spec.bytes().all(|b| b.is_ascii_digit()) {
        let port = spec
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| TargetError::InvalidPort(spec.to_string()))?;
        format!("http://{}:{}", LOOPBACK_HOST, port)
    } else if !spec.contains("://") {
        format!("http://{}", spec)
    } else {
        spec.to_string()
    };

    let url = Url::parse(&source).map_err(|e| TargetError::Invalid {
        spec: spec.to_string(),
        reason: e.to_string(),
    })?;

    let scheme =
        Scheme::parse(url.scheme()).ok_or_else(|| TargetError::UnsupportedScheme(url.scheme().to_string()))?;

    if !url.username().is_empty() || url.password().is_some() {
        return Err(TargetError::Credentials(spec.to_string()));
    }
    if url.fragment().is_some() {
        return Err(TargetError::Fragment(spec.to_string()));
    }

    let host = match url.host_str() {
        Some(h) if !h.is_empty() => h.to_string(),
        _ => {
            return Err(TargetError::Invalid {
                spec: spec.to_string(),
                reason: "missing host".to_string(),
            })
        }
    };

    let port = match (url.port_or_known_default(), policy) {
        (Some(0), _) => return Err(TargetError::InvalidPort(spec.to_string())),
        (Some(p), _) => p,
        (None, PortPolicy::Lenient) => scheme.default_port(),
        (None, PortPolicy::Strict) => return Err(TargetError::MissingPort(spec.to_string())),
    };

    Ok(ResolvedTarget {
        scheme,
        host,
        port,
        path: url.path().trim_end_matches('/').to_string(),
        query: url.query().filter(|q| !q.is_empty()).map(str::to_string),
    })
}
