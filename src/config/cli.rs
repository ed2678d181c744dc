//! Command-line and environment surface.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::Parser;

use crate::config::schema::{LogFormat, ModeChoice, RawConfig};

#[derive(Debug, Default, Parser)]
#[command(name = "tailnet-ingress", version)]
#[command(about = "Expose a single HTTP backend through a network ingress", long_about = None)]
pub struct Cli {
    /// TOML file with defaults for any of the options below
    #[arg(long, env = "TSNS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Hostname to use on the network
    #[arg(long, env = "TSNS_HOSTNAME")]
    pub hostname: Option<String>,

    /// Coordination server URL; leave empty for the provider default
    #[arg(long, env = "TS_CONTROL_URL")]
    pub control_url: Option<String>,

    /// Backend to proxy to: a port, host:port, or URL
    #[arg(long, env = "TSNS_BACKEND")]
    pub backend: Option<String>,

    /// Port to listen on [default: 443]
    #[arg(long, env = "TSNS_LISTEN_PORT", allow_negative_numbers = true)]
    pub listen_port: Option<i64>,

    /// Expose the backend on the public internet
    #[arg(
        long,
        env = "TSNS_FUNNEL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub funnel: Option<bool>,

    /// Path to mount the proxy on [default: /]
    #[arg(long, env = "TSNS_MOUNT_PATH")]
    pub mount_path: Option<String>,

    /// Only serve paths matching this regex
    #[arg(long, env = "TSNS_ALLOWED_PATHS")]
    pub allowed_paths: Option<String>,

    /// Reject paths matching this regex with 403
    #[arg(long, env = "TSNS_DENIED_PATHS")]
    pub denied_paths: Option<String>,

    /// Deployment mode; defaults to `active` with --funnel, else `declarative`
    #[arg(long, env = "TSNS_MODE", value_enum)]
    pub mode: Option<ModeChoice>,

    /// Directory to store state in [default: /state]
    #[arg(long, env = "TSNS_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Address the listener binds to [default: 0.0.0.0]
    #[arg(long, env = "TSNS_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// PEM certificate chain for TLS termination
    #[arg(long, env = "TSNS_TLS_CERT")]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key for TLS termination
    #[arg(long, env = "TSNS_TLS_KEY")]
    pub tls_key: Option<PathBuf>,

    /// Domain certified for this node (repeatable)
    #[arg(long = "domain", env = "TSNS_DOMAINS", value_delimiter = ',')]
    pub domains: Vec<String>,

    /// Log level or filter directive [default: info]
    #[arg(long, env = "TSNS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, env = "TSNS_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "TSNS_METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}

impl Cli {
    /// Split off the config file path and return the remaining options.
    pub fn into_parts(self) -> (Option<PathBuf>, RawConfig) {
        let raw = RawConfig {
            hostname: self.hostname,
            control_url: self.control_url,
            backend: self.backend,
            listen_port: self.listen_port,
            funnel: self.funnel,
            mount_path: self.mount_path,
            allowed_paths: self.allowed_paths,
            denied_paths: self.denied_paths,
            mode: self.mode,
            state_dir: self.state_dir,
            bind_address: self.bind_address,
            tls_cert: self.tls_cert,
            tls_key: self.tls_key,
            domains: (!self.domains.is_empty()).then_some(self.domains),
            log_level: self.log_level,
            log_format: self.log_format,
            metrics_address: self.metrics_address,
        };
        (self.config, raw)
    }
}
