//! API client subsystem.
//!
//! # Data Flow
//! ```text
//! caller (path, params, method, options)
//!     → params.rs (query string or form body)
//!     → executor.rs (credential check, send, failover)
//!     → outcome.rs (JSON classification or raw body stream)
//! ```
//!
//! # Design Decisions
//! - One `ApiClient` per process, shared via `Arc`
//! - HTTP and business failures are returned as data
//! - Endpoint choice is delegated to `endpoints::EndpointSelector`

pub mod error;
pub mod executor;
pub mod outcome;
pub mod params;

pub use error::{ApiError, MISSING_CREDENTIAL_MESSAGE, NETWORK_FAILURE_MESSAGE};
pub use executor::{ApiClient, ReplyChannel, RequestOptions, ResponseMode};
pub use outcome::{ApiOutcome, BodyStream, Classification, JsonOutcome, StreamError};
pub use params::{to_params, Params};
