//! Traced outbound HTTP.
//!
//! [`TracedClient`] decorates a [`reqwest::Client`] so every outbound call
//! becomes a span and carries a propagated trace context. The decorator is
//! transparent to control flow: responses and errors reach the caller
//! exactly as reqwest produced them, and the request span ends exactly once
//! on every path.

use glimmer_protocol::{AttributeValue, TraceContext};
use reqwest::Method;
use serde::Serialize;

use crate::tracer::Tracer;

/// Span name for every intercepted request
pub const HTTP_SPAN_NAME: &str = "http_request";

/// Informational companion to `traceparent`
pub const TRACESTATE: &str = "glimmer=1";

/// A reqwest client wrapper that spans and propagates every request
#[derive(Clone)]
pub struct TracedClient {
    client: reqwest::Client,
    tracer: Tracer,
}

impl TracedClient {
    pub fn new(tracer: Tracer) -> Self {
        Self {
            client: reqwest::Client::new(),
            tracer,
        }
    }

    /// Wrap an existing client (custom TLS, proxies, timeouts)
    pub fn with_client(tracer: Tracer, client: reqwest::Client) -> Self {
        Self { client, tracer }
    }

    pub fn get(&self, url: impl Into<String>) -> TracedRequest {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: impl Into<String>) -> TracedRequest {
        self.request(Method::POST, url)
    }

    pub fn request(&self, method: Method, url: impl Into<String>) -> TracedRequest {
        let url = url.into();
        TracedRequest {
            builder: self.client.request(method.clone(), url.clone()),
            tracer: self.tracer.clone(),
            method: method.to_string(),
            url,
            parent: None,
        }
    }
}

/// One outbound request being assembled.
///
/// Caller-supplied headers, query pairs, and bodies pass straight through to
/// reqwest; the propagation headers are merged in at send time.
pub struct TracedRequest {
    builder: reqwest::RequestBuilder,
    tracer: Tracer,
    method: String,
    url: String,
    parent: Option<TraceContext>,
}

impl TracedRequest {
    pub fn header(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(key, value.as_ref());
        self
    }

    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    /// Make the request span a child of `parent`, so the downstream service
    /// continues the caller's trace
    pub fn with_parent(mut self, parent: &TraceContext) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Send the request.
    ///
    /// A span named [`HTTP_SPAN_NAME`] covers the call; the outgoing request
    /// gains `traceparent` and `tracestate` headers derived from that span's
    /// context. Response status lands in the span's attributes; a transport
    /// error is recorded as an exception and returned unchanged.
    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let mut span_builder = self
            .tracer
            .span(HTTP_SPAN_NAME)
            .with_attribute("http.method", self.method.as_str())
            .with_attribute("http.url", self.url.as_str())
            .with_attribute("component", "http");
        if let Some(parent) = &self.parent {
            span_builder = span_builder.with_parent(parent);
        }
        let span = span_builder.start();

        let request = self
            .builder
            .header("traceparent", span.context().to_traceparent())
            .header("tracestate", TRACESTATE);

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                span.set_attributes([
                    ("http.status_code", AttributeValue::Int(status.as_u16() as i64)),
                    (
                        "http.status_text",
                        AttributeValue::from(status.canonical_reason().unwrap_or("")),
                    ),
                    ("http.success", AttributeValue::Bool(status.is_success())),
                ]);
                span.end();
                Ok(response)
            }
            Err(error) => {
                span.record_exception(&error);
                span.end();
                Err(error)
            }
        }
    }
}
