//! Endpoint registry.
//!
//! # Responsibilities
//! - Hold the fixed, ordered set of named backend base URLs
//! - Resolve keys and base URLs back to endpoints
//! - Provide positional access for the full-outage rotation

use serde::Serialize;
use thiserror::Error;

use crate::config::GatewayConfig;

/// A single named backend base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    /// Registry key, also usable as a fixed mode.
    pub key: String,
    /// Base URL without a trailing slash.
    pub base_url: String,
}

impl Endpoint {
    pub fn new(key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            key: key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Join a request path onto this endpoint's base URL.
    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("endpoint registry must not be empty")]
    Empty,

    #[error("endpoint key '{0}' is registered twice")]
    DuplicateKey(String),

    #[error("default endpoint '{0}' is not registered")]
    UnknownDefault(String),
}

/// Fixed, ordered collection of endpoints.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
    default_index: usize,
}

impl EndpointRegistry {
    /// Build a registry; `default_key` names the drift-guard fallback.
    pub fn new(endpoints: Vec<Endpoint>, default_key: &str) -> Result<Self, RegistryError> {
        if endpoints.is_empty() {
            return Err(RegistryError::Empty);
        }
        for (i, endpoint) in endpoints.iter().enumerate() {
            if endpoints[..i].iter().any(|e| e.key == endpoint.key) {
                return Err(RegistryError::DuplicateKey(endpoint.key.clone()));
            }
        }
        let default_index = endpoints
            .iter()
            .position(|e| e.key == default_key)
            .ok_or_else(|| RegistryError::UnknownDefault(default_key.to_string()))?;

        Ok(Self {
            endpoints,
            default_index,
        })
    }

    /// Build the registry described by a validated configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RegistryError> {
        let endpoints = config
            .endpoints
            .iter()
            .map(|e| Endpoint::new(e.key.clone(), e.url.clone()))
            .collect();
        Self::new(endpoints, &config.failover.default_endpoint)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; an empty registry cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|e| e.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Endpoint at `index mod len`.
    pub fn at(&self, index: usize) -> &Endpoint {
        &self.endpoints[index % self.endpoints.len()]
    }

    pub fn default_endpoint(&self) -> &Endpoint {
        &self.endpoints[self.default_index]
    }

    /// Reverse lookup by base URL (trailing slashes ignored).
    pub fn find_by_url(&self, url: &str) -> Option<&Endpoint> {
        let url = url.trim_end_matches('/');
        self.endpoints.iter().find(|e| e.base_url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EndpointRegistry {
        EndpointRegistry::new(
            vec![
                Endpoint::new("default", "https://df-api.shallow.ink/"),
                Endpoint::new("esa", "https://df-api-esa.shallow.ink"),
                Endpoint::new("eo", "https://df-api-eo.shallow.ink"),
            ],
            "default",
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_and_order() {
        let reg = registry();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.keys().collect::<Vec<_>>(), ["default", "esa", "eo"]);
        assert_eq!(reg.get("esa").unwrap().base_url, "https://df-api-esa.shallow.ink");
        assert!(reg.get("nope").is_none());
        assert_eq!(reg.default_endpoint().key, "default");
    }

    #[test]
    fn test_at_wraps() {
        let reg = registry();
        assert_eq!(reg.at(2).key, "eo");
        assert_eq!(reg.at(3).key, "default");
        assert_eq!(reg.at(7).key, "esa");
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let reg = registry();
        assert_eq!(reg.default_endpoint().base_url, "https://df-api.shallow.ink");
        assert_eq!(
            reg.find_by_url("https://df-api.shallow.ink/").unwrap().key,
            "default"
        );
    }

    #[test]
    fn test_url_for() {
        let ep = Endpoint::new("a", "http://a.test");
        assert_eq!(ep.url_for("/df/user"), "http://a.test/df/user");
        assert_eq!(ep.url_for("df/user"), "http://a.test/df/user");
    }

    #[test]
    fn test_rejects_bad_registries() {
        assert_eq!(
            EndpointRegistry::new(vec![], "x").unwrap_err(),
            RegistryError::Empty
        );
        assert_eq!(
            EndpointRegistry::new(
                vec![Endpoint::new("a", "http://a"), Endpoint::new("a", "http://b")],
                "a"
            )
            .unwrap_err(),
            RegistryError::DuplicateKey("a".into())
        );
        assert_eq!(
            EndpointRegistry::new(vec![Endpoint::new("a", "http://a")], "b").unwrap_err(),
            RegistryError::UnknownDefault("b".into())
        );
    }
}
