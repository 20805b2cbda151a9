//! Process-level setup for applications built on this crate.
//!
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure
//!
//! Library code never installs a subscriber on its own; binaries call
//! [`setup_tracing`] once at startup.

pub mod tracing;

pub use tracing::*;
