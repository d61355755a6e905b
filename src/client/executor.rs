//! Request execution with single-retry failover.
//!
//! # Responsibilities
//! - Attach the credential and encode parameters for GET / POST
//! - Send one attempt to the selected endpoint
//! - On transport failure or 5xx (auto mode only), quarantine the endpoint
//!   and retry once against the next selection
//! - Turn every result into an [`ApiOutcome`] value
//!
//! # Data Flow
//! ```text
//! execute(path, params, method, options)
//!     → credential missing? reply once, return failure (no network)
//!     → selector.current() → send
//!         ├─ 2xx        → json: parse + classify │ stream: hand body back
//!         ├─ 5xx + auto → mark_failed → retry once → 2xx wins, else original error
//!         ├─ other HTTP → error body returned as data
//!         └─ transport + auto → mark_failed → retry once → retry result is final
//! ```
//!
//! # Design Decisions
//! - The failover policy uses the mode read when the call began
//! - At most two network attempts and one failure mark per call
//! - Expected failures are values, never `Err` or panics

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::error::{ApiError, MISSING_CREDENTIAL_MESSAGE};
use crate::client::outcome::{classify, ApiOutcome, BodyStream, Classification, JsonOutcome, StreamError};
use crate::client::params::{build_url, encode_form, Params};
use crate::config::{ApiConfig, GatewayConfig, TimeoutConfig};
use crate::endpoints::{Endpoint, EndpointSelector};
use crate::observability::metrics;

/// Channel back to the end user who triggered a call.
pub trait ReplyChannel: Send + Sync {
    fn reply<'a>(&'a self, text: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

impl ReplyChannel for mpsc::UnboundedSender<String> {
    fn reply<'a>(&'a self, text: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if self.send(text.to_string()).is_err() {
                tracing::debug!("Reply channel closed");
            }
        })
    }
}

/// How the response body is handed back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseMode {
    /// Buffer and parse as JSON.
    #[default]
    Json,
    /// Return the raw body.
    Stream,
}

/// Per-call options.
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub response_mode: ResponseMode,
    pub reply: Option<Arc<dyn ReplyChannel>>,
}

impl RequestOptions {
    pub fn json() -> Self {
        Self::default()
    }

    pub fn stream() -> Self {
        Self {
            response_mode: ResponseMode::Stream,
            reply: None,
        }
    }

    pub fn with_reply(mut self, reply: Arc<dyn ReplyChannel>) -> Self {
        self.reply = Some(reply);
        self
    }
}

impl Debug for RequestOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("response_mode", &self.response_mode)
            .field("reply", &self.reply.is_some())
            .finish()
    }
}

/// Where a call ended up before the response mode shapes it.
enum Settled {
    Response(reqwest::Response),
    HttpError { status: u16, body: Value },
    Failed(ApiError),
}

/// One outgoing request, reusable across the retry.
struct Call<'a> {
    path: &'a str,
    params: &'a Params,
    method: &'a Method,
    credential: &'a str,
    mode: ResponseMode,
}

/// Shared API client. Construct once and share via `Arc`.
pub struct ApiClient {
    http: reqwest::Client,
    /// Whole-request deadline for buffered calls. Streams are bounded per read.
    request_timeout: Option<Duration>,
    selector: Arc<EndpointSelector>,
    settings: ArcSwap<ApiConfig>,
    credential_warned: AtomicBool,
}

impl ApiClient {
    pub fn new(
        selector: Arc<EndpointSelector>,
        api: ApiConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, ApiError> {
        let request_timeout = Duration::from_secs(timeouts.request_secs);
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .read_timeout(request_timeout)
            .build()
            .map_err(ApiError::Transport)?;
        let mut client = Self::with_http_client(selector, api, http);
        client.request_timeout = Some(request_timeout);
        Ok(client)
    }

    /// Build the selector and client from a full configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ApiError> {
        let selector = Arc::new(EndpointSelector::from_config(config)?);
        Self::new(selector, config.api.clone(), &config.timeouts)
    }

    /// Use a caller-built transport; its own timeouts apply unchanged.
    pub fn with_http_client(
        selector: Arc<EndpointSelector>,
        api: ApiConfig,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            request_timeout: None,
            selector,
            settings: ArcSwap::from_pointee(api),
            credential_warned: AtomicBool::new(false),
        }
    }

    pub fn selector(&self) -> &Arc<EndpointSelector> {
        &self.selector
    }

    pub fn api_config(&self) -> Arc<ApiConfig> {
        self.settings.load_full()
    }

    /// Apply reloaded API settings. The mode is only re-applied when it changed,
    /// so a reload that touches the credential keeps the quarantine state.
    pub fn apply_config(&self, api: &ApiConfig) {
        let previous = self.settings.swap(Arc::new(api.clone()));
        if previous.mode.trim() != api.mode.trim() {
            self.selector.set_mode(&api.mode);
        }
        if previous.api_key != api.api_key {
            self.credential_warned.store(false, Ordering::Relaxed);
            tracing::info!(configured = api.credential().is_some(), "API credential updated");
        }
    }

    /// Run one logical call.
    pub async fn execute(
        &self,
        path: &str,
        params: &Params,
        method: Method,
        options: RequestOptions,
    ) -> ApiOutcome {
        let reply = options.reply.as_deref();
        match options.response_mode {
            ResponseMode::Json => {
                ApiOutcome::Json(self.call_json(path, params, &method, reply).await)
            }
            ResponseMode::Stream => {
                ApiOutcome::Stream(self.call_stream(path, params, &method, reply).await)
            }
        }
    }

    pub async fn get(&self, path: &str, params: &Params) -> JsonOutcome {
        self.call_json(path, params, &Method::GET, None).await
    }

    pub async fn post(&self, path: &str, params: &Params) -> JsonOutcome {
        self.call_json(path, params, &Method::POST, None).await
    }

    pub async fn stream(
        &self,
        path: &str,
        params: &Params,
        method: Method,
    ) -> Result<BodyStream, StreamError> {
        self.call_stream(path, params, &method, None).await
    }

    async fn call_json(
        &self,
        path: &str,
        params: &Params,
        method: &Method,
        reply: Option<&dyn ReplyChannel>,
    ) -> JsonOutcome {
        let span = call_span(method, path, ResponseMode::Json);
        async move {
            let start = Instant::now();
            let settled = self.dispatch(path, params, method, ResponseMode::Json, reply).await;
            let (outcome, label) = match settled {
                Settled::Response(response) => read_json(path, response).await,
                Settled::HttpError { status, body } => {
                    (JsonOutcome::HttpError { status, body }, "http_error")
                }
                Settled::Failed(err) => {
                    let label = failure_label(&err);
                    (JsonOutcome::Failed(err), label)
                }
            };
            metrics::record_request(method.as_str(), label, start);
            outcome
        }
        .instrument(span)
        .await
    }

    async fn call_stream(
        &self,
        path: &str,
        params: &Params,
        method: &Method,
        reply: Option<&dyn ReplyChannel>,
    ) -> Result<BodyStream, StreamError> {
        let span = call_span(method, path, ResponseMode::Stream);
        async move {
            let start = Instant::now();
            let settled = self.dispatch(path, params, method, ResponseMode::Stream, reply).await;
            let (outcome, label) = match settled {
                Settled::Response(response) => (Ok(BodyStream::new(response)), "ok"),
                Settled::HttpError { status, body } => {
                    (Err(StreamError::http(status, body)), "http_error")
                }
                Settled::Failed(err) => (
                    Err(StreamError::message(err.user_message())),
                    failure_label(&err),
                ),
            };
            metrics::record_request(method.as_str(), label, start);
            outcome
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        path: &str,
        params: &Params,
        method: &Method,
        mode: ResponseMode,
        reply: Option<&dyn ReplyChannel>,
    ) -> Settled {
        let settings = self.settings.load_full();
        let Some(credential) = settings.credential() else {
            self.report_missing_credential(reply).await;
            return Settled::Failed(ApiError::MissingCredential);
        };

        let call = Call {
            path,
            params,
            method,
            credential,
            mode,
        };
        let auto = self.selector.mode().is_auto();
        let endpoint = self.selector.current();

        match self.send(&endpoint, &call).await {
            Ok(response) if response.status().is_success() => Settled::Response(response),
            Ok(response) => {
                let (status, body) = read_error_body(response).await;
                tracing::error!(
                    endpoint = %endpoint.key,
                    status = status,
                    body = %body,
                    "API request returned error status"
                );

                if status >= 500 && auto {
                    match self.failover(&endpoint, &call).await {
                        Some(Ok(retry)) if retry.status().is_success() => {
                            return Settled::Response(retry);
                        }
                        Some(Ok(retry)) => tracing::warn!(
                            status = retry.status().as_u16(),
                            "Failover retry returned error status, keeping original error"
                        ),
                        Some(Err(err)) => tracing::warn!(
                            error = %err,
                            "Failover retry failed, keeping original error"
                        ),
                        None => {}
                    }
                }
                Settled::HttpError { status, body }
            }
            Err(err) => {
                tracing::error!(error = %err, "API request failed");

                if auto {
                    match self.failover(&endpoint, &call).await {
                        Some(Ok(retry)) if retry.status().is_success() => {
                            return Settled::Response(retry);
                        }
                        Some(Ok(retry)) => {
                            let (status, body) = read_error_body(retry).await;
                            tracing::error!(
                                status = status,
                                body = %body,
                                "Failover retry returned error status"
                            );
                            return Settled::HttpError { status, body };
                        }
                        Some(Err(retry_err)) => {
                            tracing::error!(error = %retry_err, "Failover retry failed");
                        }
                        None => {}
                    }
                }
                Settled::Failed(err)
            }
        }
    }

    /// Quarantine `failed` and retry once if selection moves elsewhere.
    async fn failover(
        &self,
        failed: &Endpoint,
        call: &Call<'_>,
    ) -> Option<Result<reqwest::Response, ApiError>> {
        self.selector.mark_failed(&failed.key);
        let next = self.selector.current();
        if next.base_url == failed.base_url {
            tracing::warn!(endpoint = %failed.key, "No alternate endpoint available for retry");
            return None;
        }

        metrics::record_failover(&failed.key, &next.key);
        tracing::info!(from = %failed.key, to = %next.key, "Retrying on alternate endpoint");
        Some(self.send(&next, call).await)
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        call: &Call<'_>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = build_url(endpoint, call.path, call.method, call.params);
        let mut request = self
            .http
            .request(call.method.clone(), &url)
            .bearer_auth(call.credential);
        if let (ResponseMode::Json, Some(timeout)) = (call.mode, self.request_timeout) {
            request = request.timeout(timeout);
        }
        if *call.method == Method::POST {
            request = request
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encode_form(call.params));
        }

        metrics::record_attempt(&endpoint.key);
        tracing::debug!(endpoint = %endpoint.key, url = %url, "Sending API request");

        request.send().await.map_err(|source| ApiError::Network {
            endpoint: endpoint.key.clone(),
            url,
            source,
        })
    }

    async fn report_missing_credential(&self, reply: Option<&dyn ReplyChannel>) {
        if self.credential_warned.swap(true, Ordering::Relaxed) {
            tracing::debug!("API credential not configured, skipping request");
        } else {
            tracing::error!("API credential not configured, requests will not be sent");
        }
        if let Some(reply) = reply {
            reply.reply(MISSING_CREDENTIAL_MESSAGE).await;
        }
    }
}

impl Debug for ApiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("selector", &self.selector)
            .field("credential_configured", &self.settings.load().credential().is_some())
            .finish()
    }
}

fn call_span(method: &Method, path: &str, mode: ResponseMode) -> tracing::Span {
    tracing::info_span!(
        "api_call",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %path,
        mode = ?mode
    )
}

fn failure_label(err: &ApiError) -> &'static str {
    if err.is_missing_credential() {
        "missing_credential"
    } else {
        "network_error"
    }
}

/// Buffer and classify a 2xx body. Unparseable bodies become `{}`; a body
/// that cannot be read at all is a transport failure.
async fn read_json(path: &str, response: reqwest::Response) -> (JsonOutcome, &'static str) {
    let url = response.url().to_string();
    let body = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|_| json!({})),
        Err(source) => {
            tracing::error!(url = %url, error = %source, "Failed to read response body");
            return (
                JsonOutcome::Failed(ApiError::Body { url, source }),
                "network_error",
            );
        }
    };

    match classify(path, &body) {
        Classification::Success => (JsonOutcome::Ok(body), "ok"),
        Classification::PollingPending => {
            tracing::debug!(code = %body["code"], "Status poll pending");
            (JsonOutcome::Ok(body), "ok")
        }
        Classification::BusinessError(message) => {
            tracing::warn!(code = %body["code"], message = %message, "API returned business error");
            (JsonOutcome::Ok(body), "business_error")
        }
    }
}

/// Error body as JSON, or `{"message": "API error: <reason>"}`.
async fn read_error_body(response: reqwest::Response) -> (u16, Value) {
    let status = response.status();
    let fallback = || {
        json!({
            "message": format!(
                "API error: {}",
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        })
    };
    let body = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|_| fallback()),
        Err(_) => fallback(),
    };
    (status.as_u16(), body)
}
