//! Configuration schema definitions.
//!
//! [`RawConfig`] is what a config file or the command line supplies: every
//! field optional, nothing checked. [`IngressConfig`] is the validated,
//! immutable result handed to the rest of the process.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::routing::MountPath;

pub const DEFAULT_LISTEN_PORT: u16 = 443;
pub const DEFAULT_MOUNT_PATH: &str = "/";
pub const DEFAULT_STATE_DIR: &str = "/state";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Ports on which funnel (public internet) reachability is offered.
pub const FUNNEL_PORTS: [u16; 3] = [443, 8443, 10000];

/// Explicit deployment mode override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModeChoice {
    /// Terminate connections and forward requests in-process.
    Active,
    /// Hand a forwarding spec to the serving runtime.
    Declarative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Unvalidated configuration from one source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub hostname: Option<String>,
    pub control_url: Option<String>,
    pub backend: Option<String>,
    pub listen_port: Option<i64>,
    pub funnel: Option<bool>,
    pub mount_path: Option<String>,
    pub allowed_paths: Option<String>,
    pub denied_paths: Option<String>,
    pub mode: Option<ModeChoice>,
    pub state_dir: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub domains: Option<Vec<String>>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub metrics_address: Option<String>,
}

impl RawConfig {
    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn overlay(self, other: RawConfig) -> RawConfig {
        RawConfig {
            hostname: other.hostname.or(self.hostname),
            control_url: other.control_url.or(self.control_url),
            backend: other.backend.or(self.backend),
            listen_port: other.listen_port.or(self.listen_port),
            funnel: other.funnel.or(self.funnel),
            mount_path: other.mount_path.or(self.mount_path),
            allowed_paths: other.allowed_paths.or(self.allowed_paths),
            denied_paths: other.denied_paths.or(self.denied_paths),
            mode: other.mode.or(self.mode),
            state_dir: other.state_dir.or(self.state_dir),
            bind_address: other.bind_address.or(self.bind_address),
            tls_cert: other.tls_cert.or(self.tls_cert),
            tls_key: other.tls_key.or(self.tls_key),
            domains: other.domains.or(self.domains),
            log_level: other.log_level.or(self.log_level),
            log_format: other.log_format.or(self.log_format),
            metrics_address: other.metrics_address.or(self.metrics_address),
        }
    }
}

/// Root configuration for the ingress. Immutable once validated.
#[derive(Debug, Clone, PartialEq)]
pub struct IngressConfig {
    /// Node name on the network. Providers register under it; the local
    /// provider also uses it as the certificate domain when none is given.
    pub hostname: String,

    /// Coordination server the provider registers with; provider default
    /// when unset.
    pub control_url: Option<Url>,

    /// Raw backend spec, resolved by the upstream module.
    pub backend: String,

    pub listen_port: u16,

    /// Public internet reachability.
    pub funnel: bool,

    pub mount_path: MountPath,

    /// Regex a path must match to be served.
    pub allowed_paths: Option<String>,

    /// Regex that rejects a path with 403.
    pub denied_paths: Option<String>,

    /// Explicit mode; derived from `funnel` when unset.
    pub mode: Option<ModeChoice>,

    /// Directory the network provider keeps its state in.
    pub state_dir: PathBuf,

    pub listener: ListenerConfig,

    /// Domains the provider holds certificates for.
    pub domains: Vec<String>,

    pub observability: ObservabilityConfig,
}

/// Listener settings used by the local network provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerConfig {
    pub bind_address: IpAddr,
    pub tls: Option<TlsConfig>,
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityConfig {
    /// Log level or filter directive; `RUST_LOG` takes precedence.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Prometheus exporter bind address.
    pub metrics_address: Option<SocketAddr>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
            metrics_address: None,
        }
    }
}
