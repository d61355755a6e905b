//! Call outcomes and response classification.

use std::fmt::{Display, Formatter};
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::{json, Value};

use crate::client::error::ApiError;

/// Result of one logical call, shaped by the requested response mode.
#[derive(Debug)]
pub enum ApiOutcome {
    Json(JsonOutcome),
    Stream(Result<BodyStream, StreamError>),
}

impl ApiOutcome {
    pub fn into_json(self) -> Option<JsonOutcome> {
        match self {
            ApiOutcome::Json(outcome) => Some(outcome),
            ApiOutcome::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<Result<BodyStream, StreamError>> {
        match self {
            ApiOutcome::Stream(outcome) => Some(outcome),
            ApiOutcome::Json(_) => None,
        }
    }
}

/// Buffered JSON outcome.
#[derive(Debug)]
pub enum JsonOutcome {
    /// 2xx response body. May still carry a business-level error code.
    Ok(Value),
    /// Non-2xx response not recovered by failover; the body is kept as data.
    HttpError { status: u16, body: Value },
    /// No response at all: missing credential or transport failure.
    Failed(ApiError),
}

impl JsonOutcome {
    pub fn body(&self) -> Option<&Value> {
        match self {
            JsonOutcome::Ok(body) | JsonOutcome::HttpError { body, .. } => Some(body),
            JsonOutcome::Failed(_) => None,
        }
    }

    /// The response body, or `None` where no response was obtained.
    pub fn into_body(self) -> Option<Value> {
        match self {
            JsonOutcome::Ok(body) | JsonOutcome::HttpError { body, .. } => Some(body),
            JsonOutcome::Failed(_) => None,
        }
    }

    /// 2xx and no business error in the body.
    pub fn is_success(&self) -> bool {
        matches!(self, JsonOutcome::Ok(body) if business_error(body).is_none())
    }

    /// Best-effort human-readable failure text, if the outcome is a failure.
    pub fn error_message(&self) -> Option<String> {
        match self {
            JsonOutcome::Ok(body) => business_error(body),
            JsonOutcome::HttpError { body, .. } => {
                Some(body_message(body).unwrap_or("unknown error").to_string())
            }
            JsonOutcome::Failed(err) => Some(err.user_message().to_string()),
        }
    }
}

/// Boxed stream of raw body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Raw response body handed back in stream mode.
#[derive(Debug)]
pub struct BodyStream {
    response: reqwest::Response,
}

impl BodyStream {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self { response }
    }

    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Next body chunk, `None` at end of body.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, reqwest::Error> {
        self.response.chunk().await
    }

    pub fn into_stream(self) -> ByteStream {
        self.response.bytes_stream().boxed()
    }

    /// Drain the remaining body into memory.
    pub async fn collect(self) -> Result<Bytes, reqwest::Error> {
        self.response.bytes().await
    }
}

/// Failure details returned in stream mode.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamError {
    /// HTTP status, when the failure was an HTTP response.
    pub status: Option<u16>,
    /// Error body: the upstream JSON, or `{"message": ...}`.
    pub body: Value,
}

impl StreamError {
    pub fn message(text: &str) -> Self {
        Self {
            status: None,
            body: json!({ "message": text }),
        }
    }

    pub fn http(status: u16, body: Value) -> Self {
        Self {
            status: Some(status),
            body,
        }
    }

    pub fn text(&self) -> Option<&str> {
        body_message(&self.body)
    }
}

impl Display for StreamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.status, self.text()) {
            (Some(status), Some(text)) => write!(f, "HTTP {}: {}", status, text),
            (Some(status), None) => write!(f, "HTTP {}", status),
            (None, Some(text)) => f.write_str(text),
            (None, None) => f.write_str("stream request failed"),
        }
    }
}

impl std::error::Error for StreamError {}

/// How a 2xx body should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success,
    /// Non-zero code on a status-polling endpoint: an expected pending state.
    PollingPending,
    BusinessError(String),
}

/// Login / OAuth status-polling endpoints report progress via non-zero codes.
pub fn is_polling_path(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    let login_status = path.contains("/login/") && path.contains("/status");
    let oauth_status = path.contains("/oauth/status") || path.contains("/oauth/platform-status");
    login_status || oauth_status
}

/// Business error text when `code` is present and non-zero and `success` is not `true`.
pub fn business_error(body: &Value) -> Option<String> {
    let code = body.get("code")?;
    if is_zero_code(code) || body.get("success") == Some(&Value::Bool(true)) {
        return None;
    }
    Some(body_message(body).unwrap_or("unknown error").to_string())
}

pub fn classify(path: &str, body: &Value) -> Classification {
    match business_error(body) {
        None => Classification::Success,
        Some(_) if is_polling_path(path) => Classification::PollingPending,
        Some(message) => Classification::BusinessError(message),
    }
}

fn is_zero_code(code: &Value) -> bool {
    match code {
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Null => true,
        _ => false,
    }
}

fn body_message(body: &Value) -> Option<&str> {
    ["msg", "message"]
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polling_paths() {
        assert!(is_polling_path("/login/qq/status"));
        assert!(is_polling_path("/login/wechat/status?frameworkToken=x"));
        assert!(is_polling_path("/df/oauth/status"));
        assert!(is_polling_path("/oauth/platform-status"));
        assert!(!is_polling_path("/login/qq/qr"));
        assert!(!is_polling_path("/df/person/info"));
        assert!(!is_polling_path("/df/status"));
    }

    #[test]
    fn test_business_error_rules() {
        assert_eq!(business_error(&json!({ "code": 0, "data": [] })), None);
        assert_eq!(business_error(&json!({ "data": [] })), None);
        assert_eq!(business_error(&json!({ "code": 1, "success": true })), None);
        assert_eq!(
            business_error(&json!({ "code": 1, "msg": "token expired" })),
            Some("token expired".to_string())
        );
        assert_eq!(
            business_error(&json!({ "code": -1, "message": "bad id" })),
            Some("bad id".to_string())
        );
        assert_eq!(
            business_error(&json!({ "code": "E42", "success": false })),
            Some("unknown error".to_string())
        );
    }

    #[test]
    fn test_polling_exemption() {
        let pending = json!({ "code": 1, "msg": "waiting for scan" });
        assert_eq!(
            classify("/login/qq/status", &pending),
            Classification::PollingPending
        );
        assert_eq!(
            classify("/df/person/info", &pending),
            Classification::BusinessError("waiting for scan".into())
        );
        assert_eq!(
            classify("/login/qq/status", &json!({ "code": 0 })),
            Classification::Success
        );
    }

    #[test]
    fn test_json_outcome_helpers() {
        let ok = JsonOutcome::Ok(json!({ "code": 0 }));
        assert!(ok.is_success());
        assert!(ok.error_message().is_none());

        let business = JsonOutcome::Ok(json!({ "code": 2, "msg": "no data" }));
        assert!(!business.is_success());
        assert_eq!(business.error_message().as_deref(), Some("no data"));

        let http = JsonOutcome::HttpError {
            status: 404,
            body: json!({ "message": "API error: Not Found" }),
        };
        assert!(!http.is_success());
        assert_eq!(http.body().unwrap()["message"], "API error: Not Found");

        let failed = JsonOutcome::Failed(ApiError::MissingCredential);
        assert!(failed.body().is_none());
        assert!(failed.into_body().is_none());
    }

    #[test]
    fn test_stream_error_display() {
        assert_eq!(StreamError::message("boom").to_string(), "boom");
        assert_eq!(
            StreamError::http(502, json!({ "msg": "bad gateway" })).to_string(),
            "HTTP 502: bad gateway"
        );
        assert_eq!(StreamError::http(500, json!({})).to_string(), "HTTP 500");
    }
}
