//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → middleware/access_control.rs (allow/deny on the inbound path)
//!     → rewrite.rs (strip mount, retarget URI, forwarded headers)
//!     → upstream client
//!     → response.rs (drop hop-by-hop headers)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod rewrite;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::RequestError;
pub use rewrite::RequestRewriter;
pub use server::{HttpServer, ProxyContext};
