//! Mount path matching.
//!
//! # Responsibilities
//! - Normalize the configured mount path
//! - Strip it from inbound paths on a segment boundary
//!
//! # Design Decisions
//! - Stored without trailing slash, `""` for root
//! - Path matching is case-sensitive
//! - `/svc` does not match `/svcx`; only `/svc` and `/svc/...`
//! - A path equal to the mount path is forwarded as `/`

use std::fmt;

/// Public path prefix under which the backend is exposed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MountPath(String);

impl MountPath {
    /// Normalize a configured mount path by stripping one trailing slash.
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        Self(path.strip_suffix('/').unwrap_or(path).to_string())
    }

    /// The root mount.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Key used for the mount in a declarative forward spec (`/` for root).
    pub fn handler_key(&self) -> &str {
        if self.is_root() {
            "/"
        } else {
            &self.0
        }
    }

    /// Strip the mount path from `path`.
    ///
    /// Returns `None` when `path` is not under the mount. The result always
    /// starts with `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.0.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

impl fmt::Display for MountPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.handler_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_single_trailing_slash() {
        assert_eq!(MountPath::new("/").as_str(), "");
        assert_eq!(MountPath::new("/app/").as_str(), "/app");
        assert_eq!(MountPath::new("/app").as_str(), "/app");
        assert!(MountPath::new("/").is_root());
    }

    #[test]
    fn strips_prefix_on_segment_boundary() {
        let mount = MountPath::new("/svc");
        assert_eq!(mount.strip("/svc/users/1"), Some("/users/1"));
        assert_eq!(mount.strip("/svc/"), Some("/"));
        assert_eq!(mount.strip("/svc"), Some("/"));
        assert_eq!(mount.strip("/svcx"), None);
        assert_eq!(mount.strip("/other"), None);
        assert_eq!(mount.strip("/SVC/users"), None);
    }

    #[test]
    fn root_mount_keeps_path() {
        let mount = MountPath::root();
        assert_eq!(mount.strip("/users/1"), Some("/users/1"));
        assert_eq!(mount.strip("/"), Some("/"));
        assert_eq!(mount.strip(""), Some("/"));
    }

    #[test]
    fn handler_key() {
        assert_eq!(MountPath::root().handler_key(), "/");
        assert_eq!(MountPath::new("/app/").handler_key(), "/app");
    }
}
