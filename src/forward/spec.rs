//! Declarative forward spec.
//!
//! The serving runtime consumes this structure verbatim and performs the
//! forwarding itself. Shape:
//!
//! ```text
//! listen port → { terminate_tls, hosts: { "domain:port" → { mount → { proxy: backend URL } } } }
//! ```
//!
//! Access rules and mount stripping are not expressible here; they only
//! exist in active proxy mode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::MountPath;
use crate::upstream::ResolvedTarget;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    #[error("no certificate domains available, enable HTTPS for this node")]
    NoDomain,
}

/// Routing table handed to the serving runtime.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeclarativeForwardSpec {
    pub listeners: BTreeMap<u16, ListenerSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListenerSpec {
    /// The runtime terminates TLS on this port.
    pub terminate_tls: bool,
    /// `domain:port` → mount path → handler.
    pub hosts: BTreeMap<String, BTreeMap<String, HandlerSpec>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSpec {
    /// Backend URL; `https+insecure` tells the runtime to skip verification.
    pub proxy: String,
}

impl DeclarativeForwardSpec {
    /// Build the single-upstream spec for `domain` on `listen_port`.
    pub fn build(
        target: &ResolvedTarget,
        mount: &MountPath,
        domain: &str,
        listen_port: u16,
    ) -> Result<Self, ForwardError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(ForwardError::NoDomain);
        }

        let handlers = BTreeMap::from([(
            mount.handler_key().to_string(),
            HandlerSpec {
                proxy: target.to_string(),
            },
        )]);
        let listener = ListenerSpec {
            terminate_tls: true,
            hosts: BTreeMap::from([(format!("{}:{}", domain, listen_port), handlers)]),
        };

        Ok(Self {
            listeners: BTreeMap::from([(listen_port, listener)]),
        })
    }

    /// Build from the domains the provider reports; the first one is used.
    pub fn for_domains(
        target: &ResolvedTarget,
        mount: &MountPath,
        domains: &[String],
        listen_port: u16,
    ) -> Result<Self, ForwardError> {
        let domain = domains.first().ok_or(ForwardError::NoDomain)?;
        Self::build(target, mount, domain, listen_port)
    }

    /// Backend URL registered for a listener, host and mount, if any.
    pub fn proxy_for(&self, listen_port: u16, host_port: &str, mount_key: &str) -> Option<&str> {
        self.listeners
            .get(&listen_port)?
            .hosts
            .get(host_port)?
            .get(mount_key)
            .map(|h| h.proxy.as_str())
    }
}
