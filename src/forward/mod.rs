//! Declarative forwarding.
//!
//! In declarative mode the process never sees a request: it resolves the
//! backend, builds a [`DeclarativeForwardSpec`] and hands it to the network
//! provider's serving runtime.

pub mod spec;

pub use spec::{DeclarativeForwardSpec, ForwardError, HandlerSpec, ListenerSpec};
