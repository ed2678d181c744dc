//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! backend spec ("3000", "host:port", "https+insecure://h:9000/base")
//!     → target.rs (normalize & validate)
//!     → ResolvedTarget (immutable, shared via Arc)
//!     → transport.rs (pooled client, TLS trust decided once)
//! ```

pub mod target;
pub mod transport;

pub use target::{resolve, resolve_strict, ResolvedTarget, Scheme, TargetError};
pub use transport::{UpstreamClient, UpstreamTransport};
