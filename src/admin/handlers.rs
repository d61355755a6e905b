use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::endpoints::SelectorStatus;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub client: Arc<ApiClient>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(client: Arc<ApiClient>, api_key: &str) -> Self {
        Self {
            client,
            api_key: Arc::from(api_key),
        }
    }
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub credential_configured: bool,
    pub endpoints: Vec<EndpointStatus>,
    pub selector: SelectorStatus,
}

#[derive(Serialize)]
pub struct EndpointStatus {
    pub key: String,
    pub url: String,
    pub quarantined: bool,
}

#[derive(Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

#[derive(Serialize)]
pub struct ModeResponse {
    pub requested: String,
    pub mode: String,
    pub accepted: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let selector = state.client.selector();
    let status = selector.status();
    let endpoints = selector
        .registry()
        .iter()
        .map(|e| EndpointStatus {
            key: e.key.clone(),
            url: e.base_url.clone(),
            quarantined: status.quarantined_keys.contains(&e.key),
        })
        .collect();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        credential_configured: state.client.api_config().credential().is_some(),
        endpoints,
        selector: status,
    })
}

pub async fn set_mode(
    State(state): State<AdminState>,
    Json(request): Json<ModeRequest>,
) -> Json<ModeResponse> {
    let requested = request.mode.trim().to_string();
    let mode = state.client.selector().set_mode(&requested);
    Json(ModeResponse {
        accepted: mode.as_str() == requested,
        mode: mode.to_string(),
        requested,
    })
}

pub async fn reset_failures(State(state): State<AdminState>) -> Json<SelectorStatus> {
    let selector = state.client.selector();
    selector.reset_failures();
    Json(selector.status())
}
