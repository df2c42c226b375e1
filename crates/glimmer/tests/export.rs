//! End-to-end export tests against a live in-process collector.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use glimmer::{Tracer, TracerConfig};
use serde_json::Value;

type Received = Arc<Mutex<Vec<Value>>>;

/// Spawn an OTLP-shaped collector on an ephemeral port; returns its trace
/// endpoint and the envelopes it has accepted.
async fn spawn_collector() -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    async fn ingest(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
        received.lock().unwrap().push(body);
        StatusCode::OK
    }

    let app = Router::new()
        .route("/v1/traces", post(ingest))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1/traces"), received)
}

async fn wait_for_envelopes(received: &Received, count: usize) -> Vec<Value> {
    for _ in 0..300 {
        {
            let got = received.lock().unwrap();
            if got.len() >= count {
                return got.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("collector did not receive {count} envelope(s) in time");
}

fn tracer_for(endpoint: &str) -> Tracer {
    Tracer::new(
        TracerConfig::new("gutenberg-search-frontend")
            .with_environment("development")
            .with_collector_url(endpoint),
    )
}

fn span_entry(envelope: &Value) -> &Value {
    &envelope["resourceSpans"][0]["scopeSpans"][0]["spans"][0]
}

fn attribute<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry["attributes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|kv| kv["key"] == key)
        .and_then(|kv| kv["value"]["stringValue"].as_str())
}

#[tokio::test]
async fn search_span_reaches_the_collector() {
    let (endpoint, received) = spawn_collector().await;
    let tracer = tracer_for(&endpoint);

    let span = tracer.span("search").start();
    span.set_attribute("search.query", "moby dick");
    span.end();

    let envelopes = wait_for_envelopes(&received, 1).await;
    assert_eq!(envelopes.len(), 1);

    let entry = span_entry(&envelopes[0]);
    assert_eq!(entry["name"], "search");
    assert_eq!(entry["kind"], "SPAN_KIND_CLIENT");
    assert_eq!(entry["status"]["code"], "STATUS_CODE_OK");
    assert_eq!(attribute(entry, "search.query"), Some("moby dick"));
    assert_eq!(entry["traceId"].as_str().unwrap().len(), 32);
    assert_eq!(entry["spanId"].as_str().unwrap().len(), 16);

    // Timestamps ride as decimal strings and never run backwards
    let start: u64 = entry["startTimeUnixNano"].as_str().unwrap().parse().unwrap();
    let end: u64 = entry["endTimeUnixNano"].as_str().unwrap().parse().unwrap();
    assert!(end >= start);

    let service = envelopes[0]["resourceSpans"][0]["resource"]["attributes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|kv| kv["key"] == "service.name")
        .unwrap();
    assert_eq!(service["value"]["stringValue"], "gutenberg-search-frontend");
}

#[derive(Debug)]
struct BackendDown;

impl std::fmt::Display for BackendDown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("backend down")
    }
}

impl std::error::Error for BackendDown {}

#[tokio::test]
async fn recorded_exception_exports_as_error() {
    let (endpoint, received) = spawn_collector().await;
    let tracer = tracer_for(&endpoint);

    let span = tracer.span("frontend_search").start();
    span.record_exception(&BackendDown);
    span.end();

    let envelopes = wait_for_envelopes(&received, 1).await;
    let entry = span_entry(&envelopes[0]);
    assert_eq!(entry["status"]["code"], "STATUS_CODE_ERROR");
    assert!(!attribute(entry, "error.name").unwrap().is_empty());
    assert_eq!(attribute(entry, "error.message"), Some("backend down"));
}

#[tokio::test]
async fn double_end_exports_exactly_once() {
    let (endpoint, received) = spawn_collector().await;
    let tracer = tracer_for(&endpoint);

    let span = tracer.span("once").start();
    span.end();
    span.end();

    wait_for_envelopes(&received, 1).await;
    // Let any spurious second export land before counting
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(received.lock().unwrap().len(), 1);
    assert_eq!(tracer.stats().export_attempts, 1);
}

#[tokio::test]
async fn overlapping_spans_export_independently() {
    let (endpoint, received) = spawn_collector().await;
    let tracer = tracer_for(&endpoint);

    let outer = tracer.span("user_action").start();
    let inner = tracer.span("http_call").start();
    assert_ne!(outer.span_id(), inner.span_id());
    assert_eq!(tracer.stats().open_spans, 2);

    // Inner closes first; outer must survive it
    inner.end();
    assert_eq!(tracer.stats().open_spans, 1);
    outer.set_attribute("user.action", "search_submit");
    outer.end();

    let envelopes = wait_for_envelopes(&received, 2).await;
    let names: Vec<&str> = envelopes
        .iter()
        .map(|e| span_entry(e)["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"user_action"));
    assert!(names.contains(&"http_call"));

    let ids: Vec<&str> = envelopes
        .iter()
        .map(|e| span_entry(e)["spanId"].as_str().unwrap())
        .collect();
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn unreachable_collector_is_invisible_to_the_caller() {
    // Nothing listens here; delivery fails after the span is already closed
    let tracer = tracer_for("http://127.0.0.1:9/v1/traces");

    let span = tracer.span("lonely").start();
    span.end();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(tracer.stats().export_attempts, 1);
    assert_eq!(tracer.stats().open_spans, 0);
}

#[tokio::test]
async fn rejecting_collector_is_invisible_to_the_caller() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    async fn reject(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
        received.lock().unwrap().push(body);
        StatusCode::INTERNAL_SERVER_ERROR
    }

    let app = Router::new()
        .route("/v1/traces", post(reject))
        .with_state(received.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let tracer = tracer_for(&format!("http://{addr}/v1/traces"));
    let span = tracer.span("rejected").start();
    span.end();

    // The envelope arrives, gets a 500, and nothing retries or escalates
    wait_for_envelopes(&received, 1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(received.lock().unwrap().len(), 1);
    assert_eq!(tracer.stats().export_attempts, 1);
}
