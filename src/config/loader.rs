//! Configuration loading.
//!
//! Sources, lowest precedence first: built-in defaults, the optional TOML
//! file, environment variables, command-line flags. clap resolves flag over
//! environment; the file is layered underneath here.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::cli::Cli;
use crate::config::schema::{IngressConfig, RawConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Read a TOML config file without validating it.
pub fn load_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge the config file (if any) under the command line and validate.
pub fn load_config(cli: Cli) -> Result<IngressConfig, ConfigError> {
    let (file, overrides) = cli.into_parts();
    let base = match file {
        Some(path) => load_file(&path)?,
        None => RawConfig::default(),
    };
    validate_config(base.overlay(overrides)).map_err(ConfigError::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ModeChoice;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn file_values_fill_gaps() {
        let file = write_config(
            r#"
            hostname = "web"
            backend = "https+insecure://10.0.0.5:8443"
            mount-path = "/app/"
            mode = "active"
            denied-paths = "^/admin"
            "#,
        );
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let config = load_config(cli).unwrap();
        assert_eq!(config.hostname, "web");
        assert_eq!(config.backend, "https+insecure://10.0.0.5:8443");
        assert_eq!(config.mount_path.as_str(), "/app");
        assert_eq!(config.mode, Some(ModeChoice::Active));
        assert_eq!(config.denied_paths.as_deref(), Some("^/admin"));
    }

    #[test]
    fn command_line_wins_over_file() {
        let file = write_config("hostname = \"from-file\"\nbackend = \"3000\"\nlisten-port = 8443\n");
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            hostname: Some("from-flag".into()),
            ..Default::default()
        };

        let config = load_config(cli).unwrap();
        assert_eq!(config.hostname, "from-flag");
        assert_eq!(config.listen_port, 8443);
    }

    #[test]
    fn unknown_keys_rejected() {
        let file = write_config("hostname = \"web\"\nbakend = \"3000\"\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file() {
        let err = load_file(Path::new("/nonexistent/ingress.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn validation_errors_listed() {
        let err = load_config(Cli::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: hostname is required, backend is required"
        );
    }
}
