//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     IngressConfig → select mode → IngressPlan
//!         ActiveProxy:        resolve → compile rules → build transport → listen → serve
//!         DeclarativeForward: resolve (strict) → cert domains → forward spec → apply
//!     IngressPlan::prepare → PreparedIngress::run
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Mode chosen once per process, never switched at runtime
//! - Ordered startup: config first, then plan, then listeners
//! - Shutdown drain has a deadline on TLS listeners

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{IngressMode, IngressPlan, PreparedIngress, StartupError};
