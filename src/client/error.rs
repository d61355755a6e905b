//! Client error types.

use thiserror::Error;

use crate::endpoints::RegistryError;

/// Message shown to the end user when no credential is configured.
pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "APIKey is not configured, please contact the bot administrator.";

/// Message reported for calls that never got an HTTP response.
pub const NETWORK_FAILURE_MESSAGE: &str =
    "Network request failed, please check whether the backend service is available";

/// Errors that end a logical API call without a usable response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential configured; no network attempt was made.
    #[error("APIKey is not configured, please contact the bot administrator.")]
    MissingCredential,

    /// Transport failure (connect, timeout, reset) talking to an endpoint.
    #[error("request to '{endpoint}' failed: {source}")]
    Network {
        endpoint: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A 2xx response whose body could not be read to the end.
    #[error("failed to read response body from '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP transport could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Transport(#[source] reqwest::Error),

    /// The endpoint registry could not be built from configuration.
    #[error("invalid endpoint registry: {0}")]
    Registry(#[from] RegistryError),
}

impl ApiError {
    /// Text suitable for an end-user reply.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::MissingCredential => MISSING_CREDENTIAL_MESSAGE,
            _ => NETWORK_FAILURE_MESSAGE,
        }
    }

    pub fn is_missing_credential(&self) -> bool {
        matches!(self, ApiError::MissingCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::MissingCredential;
        assert_eq!(err.to_string(), MISSING_CREDENTIAL_MESSAGE);
        assert!(err.is_missing_credential());

        let err = ApiError::Registry(RegistryError::Empty);
        assert!(err.to_string().contains("must not be empty"));
        assert_eq!(err.user_message(), NETWORK_FAILURE_MESSAGE);
    }
}
