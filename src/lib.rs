//! Resilient client for the Delta Force game-data API.
//!
//! Calls go through a fixed set of mirrored endpoints. In auto mode a failing
//! endpoint is quarantined for a cooldown and the call is retried once on the
//! next healthy one.

pub mod admin;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod lifecycle;
pub mod observability;

pub use client::{ApiClient, ApiOutcome, JsonOutcome, RequestOptions};
pub use config::schema::GatewayConfig;
pub use endpoints::{EndpointSelector, Mode};
pub use lifecycle::Shutdown;
