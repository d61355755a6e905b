//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown_signal() resolves
//!
//! Reload (reload.rs):
//!     reloaded config → credential + mode swapped, topology changes flagged
//!
//! Shutdown (shutdown.rs):
//!     trigger() → admin server drains → reload task exits
//! ```
//!
//! # Design Decisions
//! - Config is loaded and validated before anything is spawned
//! - A failed admin bind is fatal; a failed watcher is not

pub mod reload;
pub mod shutdown;
pub mod signals;

pub use reload::{ReloadApplier, ReloadReport};
pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
