//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (text or JSON)
//!     → Metrics endpoint (Prometheus scrape), when configured
//! ```
//!
//! # Design Decisions
//! - Request ID is a field on every per-request log line
//! - Metrics are cheap when no exporter is installed

pub mod logging;
pub mod metrics;
