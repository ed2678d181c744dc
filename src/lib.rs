//! Tailnet ingress library.
//!
//! Exposes a local backend to the network either by proxying requests
//! itself or by handing a declarative forward spec to a serving runtime.

pub mod config;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;
pub mod upstream;

pub use config::IngressConfig;
pub use http::HttpServer;
pub use lifecycle::{IngressPlan, Shutdown};
