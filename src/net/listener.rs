//! Listener handed out by a network provider.
//!
//! # Responsibilities
//! - Carry the bound TCP socket to the HTTP server
//! - Carry the TLS termination settings, if the provider terminates TLS
//! - Report which protocol clients see (`X-Forwarded-Proto`)

use std::fmt;
use std::net::SocketAddr;

use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;

/// Who can reach the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    /// Public internet.
    Funnel,
    /// Private network members only.
    Private,
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reachability::Funnel => f.write_str("funnel"),
            Reachability::Private => f.write_str("private"),
        }
    }
}

/// A bound listener, TLS-terminating or plain.
pub struct IngressListener {
    inner: TcpListener,
    tls: Option<RustlsConfig>,
    reachability: Reachability,
}

impl IngressListener {
    pub fn plain(inner: TcpListener, reachability: Reachability) -> Self {
        Self {
            inner,
            tls: None,
            reachability,
        }
    }

    pub fn tls(inner: TcpListener, config: RustlsConfig, reachability: Reachability) -> Self {
        Self {
            inner,
            tls: Some(config),
            reachability,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    pub fn reachability(&self) -> Reachability {
        self.reachability
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Protocol clients use to reach this listener.
    pub fn forwarded_proto(&self) -> &'static str {
        if self.is_tls() {
            "https"
        } else {
            "http"
        }
    }

    pub fn into_parts(self) -> (TcpListener, Option<RustlsConfig>) {
        (self.inner, self.tls)
    }
}
