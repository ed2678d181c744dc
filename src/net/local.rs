//! Local network provider.
//!
//! Binds plain sockets on this host, terminates TLS with operator-supplied
//! PEM files, and stores declarative forward specs as JSON in the state
//! directory for an external serving runtime to pick up. Certificate domains
//! default to the node hostname.

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::net::TcpListener;
use url::Url;

use crate::config::{IngressConfig, TlsConfig};
use crate::forward::DeclarativeForwardSpec;
use crate::net::listener::{IngressListener, Reachability};
use crate::net::provider::{NetworkProvider, ProviderError};
use crate::net::tls::load_tls_config;

/// File the forward spec is written to, inside the state directory.
pub const SERVE_CONFIG_FILE: &str = "serve-config.json";

#[derive(Debug, Clone)]
pub struct LocalProvider {
    hostname: String,
    control_url: Option<Url>,
    bind_address: IpAddr,
    tls: Option<TlsConfig>,
    domains: Vec<String>,
    state_dir: PathBuf,
}

impl LocalProvider {
    pub fn new(config: &IngressConfig) -> Self {
        if let Some(url) = &config.control_url {
            tracing::warn!(
                control_url = %url,
                "Local provider has no coordination server; control URL is recorded only"
            );
        }
        Self {
            hostname: config.hostname.clone(),
            control_url: config.control_url.clone(),
            bind_address: config.listener.bind_address,
            tls: config.listener.tls.clone(),
            domains: config.domains.clone(),
            state_dir: config.state_dir.clone(),
        }
    }

    /// Node name this provider serves as.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn control_url(&self) -> Option<&Url> {
        self.control_url.as_ref()
    }

    /// Create the state directory if needed and check it is writable.
    pub fn ensure_state_dir(&self) -> Result<(), ProviderError> {
        ensure_writable_dir(&self.state_dir)
    }

    pub fn serve_config_path(&self) -> PathBuf {
        self.state_dir.join(SERVE_CONFIG_FILE)
    }
}

fn ensure_writable_dir(path: &Path) -> Result<(), ProviderError> {
    let state_err = |reason: String| ProviderError::StateDir {
        path: path.to_path_buf(),
        reason,
    };

    fs::create_dir_all(path).map_err(|e| state_err(format!("failed to create: {}", e)))?;
    let meta = fs::metadata(path).map_err(|e| state_err(format!("failed to stat: {}", e)))?;
    if !meta.is_dir() {
        return Err(state_err("not a directory".to_string()));
    }
    if meta.permissions().readonly() {
        return Err(state_err("not writable".to_string()));
    }
    Ok(())
}

#[async_trait]
impl NetworkProvider for LocalProvider {
    async fn listen(&self, port: u16, reachability: Reachability) -> Result<IngressListener, ProviderError> {
        let addr = SocketAddr::new(self.bind_address, port);
        let tcp = TcpListener::bind(addr).await.map_err(|source| ProviderError::Listen {
            addr: addr.to_string(),
            source,
        })?;

        if reachability == Reachability::Funnel {
            tracing::warn!(
                address = %addr,
                "Local provider cannot publish to the internet; reachability follows the bind address"
            );
        }

        match &self.tls {
            Some(tls) => {
                let config = load_tls_config(&tls.cert_path, &tls.key_path)
                    .await
                    .map_err(ProviderError::Tls)?;
                tracing::info!(address = %addr, cert = ?tls.cert_path, "TLS listener bound");
                Ok(IngressListener::tls(tcp, config, reachability))
            }
            None => {
                tracing::info!(address = %addr, "Listener bound");
                Ok(IngressListener::plain(tcp, reachability))
            }
        }
    }

    /// Configured domains, or the hostname when none were given.
    async fn cert_domains(&self) -> Result<Vec<String>, ProviderError> {
        if self.domains.is_empty() {
            return Ok(vec![self.hostname.clone()]);
        }
        Ok(self.domains.clone())
    }

    async fn apply_forward_spec(&self, spec: &DeclarativeForwardSpec) -> Result<(), ProviderError> {
        let json = serde_json::to_vec_pretty(spec).map_err(|e| ProviderError::Apply(e.to_string()))?;

        let path = self.serve_config_path();
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| ProviderError::Apply(format!("write {:?}: {}", tmp, e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| ProviderError::Apply(format!("rename to {:?}: {}", path, e)))?;

        tracing::info!(path = ?path, "Forward spec written");
        Ok(())
    }
}
