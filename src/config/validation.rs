//! Configuration validation.
//!
//! # Responsibilities
//! - Check required fields and value ranges (ports, addresses)
//! - Enforce the funnel port allow-list
//! - Normalize the mount path
//! - Produce the immutable [`IngressConfig`]
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: RawConfig → Result<IngressConfig, Vec<ValidationError>>
//! - Backend resolution and pattern compilation happen at plan time, where
//!   the deployment mode decides how strict they are

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::config::schema::{
    IngressConfig, ListenerConfig, ObservabilityConfig, RawConfig, TlsConfig, DEFAULT_BIND_ADDRESS,
    DEFAULT_LISTEN_PORT, DEFAULT_LOG_LEVEL, DEFAULT_MOUNT_PATH, DEFAULT_STATE_DIR, FUNNEL_PORTS,
};
use crate::routing::MountPath;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid listen port {0}: must be in 1-65535")]
    InvalidPort(i64),

    #[error("funnel mode is only available on port 443, 8443, or 10000 (got {0})")]
    FunnelPort(u16),

    #[error("mount path {0:?} must start with '/'")]
    InvalidMountPath(String),

    #[error("tls-cert and tls-key must be set together")]
    IncompleteTls,

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),

    #[error("invalid control URL {0:?}: must be an http:// or https:// URL")]
    InvalidControlUrl(String),
}

/// Validate a merged raw configuration.
pub fn validate_config(raw: RawConfig) -> Result<IngressConfig, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let hostname = required(raw.hostname, "hostname", &mut errors);
    let backend = required(raw.backend, "backend", &mut errors);

    let listen_port = match raw.listen_port {
        None => DEFAULT_LISTEN_PORT,
        Some(p) => match u16::try_from(p) {
            Ok(port) if port != 0 => port,
            _ => {
                errors.push(ValidationError::InvalidPort(p));
                DEFAULT_LISTEN_PORT
            }
        },
    };

    let funnel = raw.funnel.unwrap_or(false);
    if funnel && !FUNNEL_PORTS.contains(&listen_port) {
        errors.push(ValidationError::FunnelPort(listen_port));
    }

    let mount_raw = raw.mount_path.unwrap_or_else(|| DEFAULT_MOUNT_PATH.to_string());
    if !mount_raw.starts_with('/') {
        errors.push(ValidationError::InvalidMountPath(mount_raw.clone()));
    }
    let mount_path = MountPath::new(&mount_raw);

    let tls = match (raw.tls_cert, raw.tls_key) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig { cert_path, key_path }),
        (None, None) => None,
        _ => {
            errors.push(ValidationError::IncompleteTls);
            None
        }
    };

    let bind_raw = raw.bind_address.unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let bind_address = bind_raw.parse::<IpAddr>().unwrap_or_else(|_| {
        errors.push(ValidationError::InvalidBindAddress(bind_raw.clone()));
        IpAddr::from([0, 0, 0, 0])
    });

    let metrics_address = raw.metrics_address.and_then(|addr| {
        addr.parse::<SocketAddr>()
            .map_err(|_| errors.push(ValidationError::InvalidMetricsAddress(addr.clone())))
            .ok()
    });

    let control_url = raw.control_url.filter(|u| !u.is_empty()).and_then(|raw_url| {
        match Url::parse(&raw_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Some(url),
            _ => {
                errors.push(ValidationError::InvalidControlUrl(raw_url));
                None
            }
        }
    });

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(IngressConfig {
        hostname,
        control_url,
        backend,
        listen_port,
        funnel,
        mount_path,
        allowed_paths: raw.allowed_paths.filter(|p| !p.is_empty()),
        denied_paths: raw.denied_paths.filter(|p| !p.is_empty()),
        mode: raw.mode,
        state_dir: raw.state_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
        listener: ListenerConfig { bind_address, tls },
        domains: raw
            .domains
            .unwrap_or_default()
            .into_iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect(),
        observability: ObservabilityConfig {
            log_level: raw.log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: raw.log_format.unwrap_or_default(),
            metrics_address,
        },
    })
}

fn required(value: Option<String>, name: &'static str, errors: &mut Vec<ValidationError>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.push(ValidationError::Missing(name));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RawConfig {
        RawConfig {
            hostname: Some("web".into()),
            backend: Some("3000".into()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_applied() {
        let config = validate_config(minimal()).unwrap();
        assert_eq!(config.listen_port, 443);
        assert!(!config.funnel);
        assert!(config.mount_path.is_root());
        assert_eq!(config.state_dir, PathBuf::from("/state"));
        assert_eq!(config.listener.bind_address, IpAddr::from([0, 0, 0, 0]));
        assert!(config.listener.tls.is_none());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn collects_every_error() {
        let raw = RawConfig {
            listen_port: Some(70000),
            tls_cert: Some("cert.pem".into()),
            ..Default::default()
        };
        let errors = validate_config(raw).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::Missing("hostname"),
                ValidationError::Missing("backend"),
                ValidationError::InvalidPort(70000),
                ValidationError::IncompleteTls,
            ]
        );
    }

    #[test]
    fn empty_required_fields_rejected() {
        let raw = RawConfig {
            hostname: Some(String::new()),
            backend: Some(String::new()),
            ..Default::default()
        };
        let errors = validate_config(raw).unwrap_err();
        assert!(errors.contains(&ValidationError::Missing("hostname")));
        assert!(errors.contains(&ValidationError::Missing("backend")));
    }

    #[test]
    fn port_bounds() {
        for bad in [0, -1, 65536] {
            let raw = RawConfig {
                listen_port: Some(bad),
                ..minimal()
            };
            assert_eq!(validate_config(raw).unwrap_err(), vec![ValidationError::InvalidPort(bad)]);
        }
        let raw = RawConfig {
            listen_port: Some(65535),
            ..minimal()
        };
        assert_eq!(validate_config(raw).unwrap().listen_port, 65535);
    }

    #[test]
    fn funnel_port_allow_list() {
        let raw = RawConfig {
            funnel: Some(true),
            listen_port: Some(80),
            ..minimal()
        };
        assert_eq!(validate_config(raw).unwrap_err(), vec![ValidationError::FunnelPort(80)]);

        for port in [443, 8443, 10000] {
            let raw = RawConfig {
                funnel: Some(true),
                listen_port: Some(port),
                ..minimal()
            };
            assert!(validate_config(raw).is_ok());
        }
    }

    #[test]
    fn non_funnel_allows_any_port() {
        let raw = RawConfig {
            listen_port: Some(80),
            ..minimal()
        };
        assert_eq!(validate_config(raw).unwrap().listen_port, 80);
    }

    #[test]
    fn mount_path_normalized() {
        let raw = RawConfig {
            mount_path: Some("/app/".into()),
            ..minimal()
        };
        assert_eq!(validate_config(raw).unwrap().mount_path.as_str(), "/app");

        let raw = RawConfig {
            mount_path: Some("app".into()),
            ..minimal()
        };
        assert_eq!(
            validate_config(raw).unwrap_err(),
            vec![ValidationError::InvalidMountPath("app".into())]
        );
    }

    #[test]
    fn addresses_parsed() {
        let raw = RawConfig {
            bind_address: Some("not-an-ip".into()),
            metrics_address: Some("127.0.0.1".into()),
            ..minimal()
        };
        assert_eq!(
            validate_config(raw).unwrap_err(),
            vec![
                ValidationError::InvalidBindAddress("not-an-ip".into()),
                ValidationError::InvalidMetricsAddress("127.0.0.1".into()),
            ]
        );
    }

    #[test]
    fn control_url_checked() {
        let raw = RawConfig {
            control_url: Some("https://login.example.com".into()),
            ..minimal()
        };
        let config = validate_config(raw).unwrap();
        assert_eq!(config.control_url.unwrap().as_str(), "https://login.example.com/");

        let raw = RawConfig {
            control_url: Some("ftp://login.example.com".into()),
            ..minimal()
        };
        assert_eq!(
            validate_config(raw).unwrap_err(),
            vec![ValidationError::InvalidControlUrl("ftp://login.example.com".into())]
        );

        let raw = RawConfig {
            control_url: Some(String::new()),
            ..minimal()
        };
        assert!(validate_config(raw).unwrap().control_url.is_none());
    }

    #[test]
    fn blank_domains_dropped() {
        let raw = RawConfig {
            domains: Some(vec![" web.tail1234.ts.net ".into(), "".into()]),
            ..minimal()
        };
        assert_eq!(validate_config(raw).unwrap().domains, vec!["web.tail1234.ts.net"]);
    }
}
