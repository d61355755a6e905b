//! Business-error logging and the status-polling exemption.

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing::Level;

use common::*;
use df_gateway::client::{JsonOutcome, Params};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_warnings() -> (Capture, tracing::subscriber::DefaultGuard) {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

#[tokio::test]
async fn test_polling_path_pending_is_not_warned() {
    let backend = start_json_backend(200, json!({ "code": 1, "msg": "waiting for scan" })).await;
    let client = client_for(&[("a", backend.url.as_str())], "auto");
    let (capture, _guard) = capture_warnings();

    let outcome = client.get("/login/qq/status", &Params::new()).await;

    match outcome {
        JsonOutcome::Ok(body) => assert_eq!(body["code"], 1),
        other => panic!("unexpected outcome: {:?}", other),
    }
    let logs = capture.contents();
    assert!(
        !logs.lines().any(|line| line.contains("WARN")),
        "unexpected warning: {}",
        logs
    );
}

#[tokio::test]
async fn test_business_error_is_warned() {
    let backend = start_json_backend(200, json!({ "code": 1, "msg": "waiting for scan" })).await;
    let client = client_for(&[("a", backend.url.as_str())], "auto");
    let (capture, _guard) = capture_warnings();

    let outcome = client.get("/df/person/info", &Params::new()).await;

    assert!(matches!(outcome, JsonOutcome::Ok(_)));
    let logs = capture.contents();
    assert!(logs.lines().any(|line| line.contains("WARN")));
    assert!(logs.contains("API returned business error"));
    assert!(logs.contains("waiting for scan"));
}
