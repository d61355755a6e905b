//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (default endpoint exists in the registry)
//! - Validate value ranges (cooldown > 0, timeouts > 0)
//! - Reject endpoint keys that collide with each other or with "auto"
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - An unknown `api.mode` is not an error; the selector degrades it to auto

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, ADMIN_KEY_PLACEHOLDER, AUTO_MODE};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one endpoint must be configured")]
    NoEndpoints,

    #[error("endpoint #{index} has an empty key")]
    EmptyKey { index: usize },

    #[error("endpoint key '{0}' is reserved")]
    ReservedKey(String),

    #[error("endpoint key '{0}' is defined more than once")]
    DuplicateKey(String),

    #[error("endpoint '{key}' has invalid url '{url}': {reason}")]
    InvalidUrl {
        key: String,
        url: String,
        reason: String,
    },

    #[error("default endpoint '{0}' is not a configured endpoint")]
    UnknownDefaultEndpoint(String),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("admin.api_key must be set to a non-placeholder value when the admin API is enabled")]
    InsecureAdminKey,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }

    let mut seen = HashSet::new();
    for (index, endpoint) in config.endpoints.iter().enumerate() {
        if endpoint.key.trim().is_empty() {
            errors.push(ValidationError::EmptyKey { index });
            continue;
        }
        if endpoint.key == AUTO_MODE {
            errors.push(ValidationError::ReservedKey(endpoint.key.clone()));
        }
        if !seen.insert(endpoint.key.as_str()) {
            errors.push(ValidationError::DuplicateKey(endpoint.key.clone()));
        }
        if let Err(reason) = check_base_url(&endpoint.url) {
            errors.push(ValidationError::InvalidUrl {
                key: endpoint.key.clone(),
                url: endpoint.url.clone(),
                reason,
            });
        }
    }

    let default_key = &config.failover.default_endpoint;
    if !config.endpoints.is_empty() && !config.endpoints.iter().any(|e| &e.key == default_key) {
        errors.push(ValidationError::UnknownDefaultEndpoint(default_key.clone()));
    }

    if config.failover.cooldown_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "failover.cooldown_secs",
        });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "timeouts.connect_secs",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "timeouts.request_secs",
        });
    }

    if config.admin.enabled {
        let key = config.admin.api_key.trim();
        if key.is_empty() || key == ADMIN_KEY_PLACEHOLDER {
            errors.push(ValidationError::InsecureAdminKey);
        }
    }

    let mode = config.api.mode.as_str();
    if mode != AUTO_MODE && !config.endpoints.iter().any(|e| e.key == mode) {
        tracing::warn!(mode = %mode, "Configured mode is not a known endpoint, auto will be used");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("base url must not carry a query or fragment".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::EndpointConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.endpoints = vec![
            EndpointConfig::new("a", "http://a.test"),
            EndpointConfig::new("a", "ftp://a.test"),
            EndpointConfig::new("auto", "http://auto.test"),
        ];
        config.failover.default_endpoint = "missing".into();
        config.failover.cooldown_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateKey("a".into())));
        assert!(errors.contains(&ValidationError::ReservedKey("auto".into())));
        assert!(errors.contains(&ValidationError::UnknownDefaultEndpoint("missing".into())));
        assert!(errors.contains(&ValidationError::ZeroDuration {
            field: "failover.cooldown_secs"
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUrl { key, .. } if key == "a")));
    }

    #[test]
    fn test_empty_endpoints_rejected() {
        let mut config = GatewayConfig::default();
        config.endpoints.clear();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoEndpoints]);
    }

    #[test]
    fn test_enabled_admin_requires_real_key() {
        let mut config = GatewayConfig::default();
        assert!(!config.admin.enabled);

        config.admin.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InsecureAdminKey]);

        config.admin.api_key = "  ".into();
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InsecureAdminKey]
        );

        config.admin.api_key = "s3cret-operator-key".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_mode_is_not_an_error() {
        let mut config = GatewayConfig::default();
        config.api.mode = "nowhere".into();
        assert!(validate_config(&config).is_ok());
    }
}
