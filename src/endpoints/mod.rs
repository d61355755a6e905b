//! Endpoint management subsystem.
//!
//! # Data Flow
//! ```text
//! GatewayConfig.endpoints
//!     → registry.rs (fixed, ordered key → base URL set)
//!     → selector.rs (mode + quarantine → base URL for next request)
//!
//! Executor failure report:
//!     → selector.mark_failed(key)
//!     → quarantine.rs (deadline = now + cooldown)
//!     → released lazily on the next selection after the deadline
//! ```
//!
//! # Design Decisions
//! - Endpoints never change after startup
//! - Selection is deterministic for a given quarantine state
//! - Total outage never blocks: the quarantine is cleared and a fixed
//!   rotation position is used

pub mod quarantine;
pub mod registry;
pub mod selector;

pub use registry::{Endpoint, EndpointRegistry, RegistryError};
pub use selector::{EndpointSelector, Mode, SelectorStatus};
