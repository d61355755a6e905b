//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Selector and executor produce:
//!     → logging.rs (structured log events, one span per logical call)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via the fmt layer
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every attempt of a logical call
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
