//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

use df_gateway::client::ApiClient;
use df_gateway::config::{EndpointConfig, GatewayConfig};

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl Recorded {
    /// Decoded query pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        decode(self.query.as_deref().unwrap_or(""))
    }

    /// Decoded form body pairs.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        decode(&self.body)
    }
}

fn decode(raw: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

type Responder = dyn Fn(&Recorded) -> (u16, &'static str, String) + Send + Sync;

#[derive(Clone)]
struct MockState {
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    responder: Arc<Responder>,
}

/// Handle to a running mock backend.
pub struct MockBackend {
    pub url: String,
    state: MockState,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("backend received no requests")
    }
}

/// Backend answering every request with the same JSON body.
pub async fn start_json_backend(status: u16, body: Value) -> MockBackend {
    let body = body.to_string();
    start_programmable_backend(move |_| (status, "application/json", body.clone())).await
}

/// Backend answering every request with a fixed non-JSON body.
pub async fn start_text_backend(status: u16, body: &'static str) -> MockBackend {
    start_programmable_backend(move |_| (status, "text/plain", body.to_string())).await
}

/// Backend whose response is computed from each recorded request.
pub async fn start_programmable_backend<F>(f: F) -> MockBackend
where
    F: Fn(&Recorded) -> (u16, &'static str, String) + Send + Sync + 'static,
{
    let state = MockState {
        hits: Arc::new(AtomicUsize::new(0)),
        requests: Arc::new(Mutex::new(Vec::new())),
        responder: Arc::new(f),
    };

    let app = Router::new().fallback(record).with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend {
        url: format!("http://{}", addr),
        state,
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let read_header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let recorded = Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: read_header(header::CONTENT_TYPE),
        authorization: read_header(header::AUTHORIZATION),
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    state.hits.fetch_add(1, Ordering::SeqCst);
    let (status, content_type, body) = (state.responder)(&recorded);
    state.requests.lock().unwrap().push(recorded);

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Handle to a listener that accepts connections and drops them unanswered.
pub struct DroppingBackend {
    pub url: String,
    accepts: Arc<AtomicUsize>,
}

impl DroppingBackend {
    /// Connections accepted so far, one per network attempt.
    pub fn attempts(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }
}

/// Backend that fails every attempt at the transport level, counting accepts.
pub async fn start_dropping_backend() -> DroppingBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepts = Arc::new(AtomicUsize::new(0));
    let counter = accepts.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    DroppingBackend {
        url: format!("http://{}", addr),
        accepts,
    }
}

/// Base URL on which nothing is listening.
pub async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Config over the given `(key, url)` endpoints; the first key is the default.
pub fn gateway_config(endpoints: &[(&str, &str)], mode: &str, api_key: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.endpoints = endpoints
        .iter()
        .map(|(key, url)| EndpointConfig::new(*key, *url))
        .collect();
    config.failover.default_endpoint = endpoints[0].0.to_string();
    config.api.api_key = api_key.to_string();
    config.api.mode = mode.to_string();
    config.timeouts.connect_secs = 2;
    config.timeouts.request_secs = 5;
    config
}

pub fn client_for(endpoints: &[(&str, &str)], mode: &str) -> ApiClient {
    ApiClient::from_config(&gateway_config(endpoints, mode, "test-key")).unwrap()
}
