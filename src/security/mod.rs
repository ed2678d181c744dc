//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (allow/deny path patterns)
//!     → headers.rs (strip hop-by-hop, append X-Forwarded-*)
//!     → Pass to rewrite
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup; a bad pattern stops the process
//! - Fail closed: a rejected request gets an explicit status code

pub mod access_control;
pub mod headers;

pub use access_control::{AccessError, AccessFilter, Decision};
