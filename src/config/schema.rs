//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Mode string that enables automatic failover between endpoints.
pub const AUTO_MODE: &str = "auto";

/// Admin key written to fresh configs. Rejected while the admin API is enabled.
pub const ADMIN_KEY_PLACEHOLDER: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Credential and mode used by every API call.
    pub api: ApiConfig,

    /// Backend endpoint definitions, in rotation order.
    pub endpoints: Vec<EndpointConfig>,

    /// Quarantine and fallback settings.
    pub failover: FailoverConfig,

    /// Transport timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            endpoints: default_endpoints(),
            failover: FailoverConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// API access configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bearer credential sent with every request. Empty means unset.
    pub api_key: String,

    /// Client identifier. Carried in config for callers; the client itself
    /// never sends it.
    pub client_id: String,

    /// Initial endpoint mode: "auto" or an endpoint key.
    pub mode: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            client_id: String::new(),
            mode: AUTO_MODE.to_string(),
        }
    }
}

impl ApiConfig {
    /// The credential, if one is configured.
    pub fn credential(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

/// A single named backend base URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Unique endpoint key (also a valid mode value).
    pub key: String,

    /// Base URL, e.g. "https://df-api.shallow.ink".
    pub url: String,
}

impl EndpointConfig {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
        }
    }
}

/// The reference deployment's endpoints.
pub fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        EndpointConfig::new("default", "https://df-api.shallow.ink"),
        EndpointConfig::new("esa", "https://df-api-esa.shallow.ink"),
        EndpointConfig::new("eo", "https://df-api-eo.shallow.ink"),
    ]
}

/// Failover configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// How long a failed endpoint stays quarantined, in seconds.
    pub cooldown_secs: u64,

    /// Starting position of the full-outage rotation index.
    pub rotation_start: usize,

    /// Endpoint used when selection drifts onto a quarantined key.
    pub default_endpoint: String,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 300, // 5 minutes
            rotation_start: 2,
            default_endpoint: "default".to_string(),
        }
    }
}

/// Timeout configuration for the HTTP transport.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Idle read timeout in seconds. Also caps each buffered JSON attempt.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: ADMIN_KEY_PLACEHOLDER.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
