//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! flags / TSNS_* environment (cli.rs)
//!     + optional TOML file (loader.rs)
//!     → RawConfig overlay (flag > env > file > default)
//!     → validation.rs (semantic checks, all errors collected)
//!     → IngressConfig (validated, immutable)
//!     → passed by reference to startup, never mutated
//! ```

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, ConfigError};
pub use schema::{IngressConfig, ListenerConfig, LogFormat, ModeChoice, ObservabilityConfig, RawConfig, TlsConfig};
pub use validation::ValidationError;
