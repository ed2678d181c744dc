//! Network provider interface.
//!
//! The provider owns the transport and identity side of the ingress: it
//! hands out listeners, knows which domains it holds certificates for, and
//! accepts declarative forward specs for its serving runtime.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::forward::DeclarativeForwardSpec;
use crate::net::listener::{IngressListener, Reachability};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load TLS configuration: {0}")]
    Tls(#[source] std::io::Error),

    #[error("state directory {path:?}: {reason}")]
    StateDir { path: PathBuf, reason: String },

    #[error("failed to apply forward spec: {0}")]
    Apply(String),
}

#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Bind a listener on `port` with the given reachability.
    async fn listen(&self, port: u16, reachability: Reachability) -> Result<IngressListener, ProviderError>;

    /// Domains this node currently holds certificates for.
    async fn cert_domains(&self) -> Result<Vec<String>, ProviderError>;

    /// Push a forward spec to the serving runtime.
    async fn apply_forward_spec(&self, spec: &DeclarativeForwardSpec) -> Result<(), ProviderError>;
}
