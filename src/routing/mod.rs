//! Routing subsystem.
//!
//! There is exactly one upstream, so routing reduces to the mount path:
//!
//! ```text
//! Incoming path "/app/%73tatus"
//!     → canonical.rs (decode, resolve dot segments) → "/app/status"
//!     → mount.rs (strip "/app" on a segment boundary)
//!     → "/status", or NoMatch (404)
//! ```

pub mod canonical;
pub mod mount;

pub use canonical::{canonicalize, encode_path};
pub use mount::MountPath;
