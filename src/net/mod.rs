//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkProvider (provider.rs)
//!     ├─ listen(port, reachability) → IngressListener (listener.rs)
//!     │       plain TCP or TLS-terminating (tls.rs)
//!     │       → Hand off to HTTP layer
//!     ├─ cert_domains() → domains for the declarative spec
//!     └─ apply_forward_spec(spec) → serving runtime
//! ```
//!
//! # Design Decisions
//! - Transport and identity live behind a trait; the ingress logic never
//!   depends on a concrete network
//! - local.rs is the provider used by the binary
//! - TLS is optional and handled by the provider

pub mod listener;
pub mod local;
pub mod provider;
pub mod tls;

pub use listener::{IngressListener, Reachability};
pub use local::LocalProvider;
pub use provider::{NetworkProvider, ProviderError};
