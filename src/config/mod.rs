//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → endpoints registry + ApiClient settings
//!
//! On file change:
//!     watcher.rs detects change (debounced)
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → ApiClient::apply_config swaps credential / mode
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Endpoints are fixed at startup; reloads only touch credential and mode

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_or_init, ConfigError};
pub use schema::{
    AdminConfig, ApiConfig, EndpointConfig, FailoverConfig, GatewayConfig, ObservabilityConfig,
    TimeoutConfig, ADMIN_KEY_PLACEHOLDER, AUTO_MODE,
};
