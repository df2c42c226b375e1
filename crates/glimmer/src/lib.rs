//! Client-side span tracing with best-effort OTLP export.
//!
//! Spans are created against a [`Tracer`], annotated while open, and shipped
//! to an OTLP/HTTP collector when ended: one POST per finished span, with a
//! local fallback record when delivery fails. [`TracedClient`] wraps
//! outbound HTTP so every request becomes a span carrying a W3C
//! `traceparent` header.
//!
//! # Example
//!
//! ```no_run
//! use glimmer::{TracedClient, TracerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracer = glimmer::init(TracerConfig::new("gutenberg-search-frontend"));
//!
//!     let span = tracer
//!         .span("frontend_search")
//!         .with_attribute("search.query", "moby dick")
//!         .start();
//!
//!     let client = TracedClient::new(tracer.clone());
//!     let response = client
//!         .get("http://localhost:8000/search")
//!         .query(&[("q", "moby dick"), ("method", "tfidf")])
//!         .with_parent(span.context())
//!         .send()
//!         .await?;
//!
//!     span.set_attribute("search.success", response.status().is_success());
//!     span.end();
//!     Ok(())
//! }
//! ```

mod config;
mod export;
mod global;
mod http;
mod registry;
mod tracer;

pub use config::TracerConfig;
pub use global::{init, tracer, TracerRef};
pub use http::{TracedClient, TracedRequest, HTTP_SPAN_NAME, TRACESTATE};
pub use tracer::{SpanBuilder, SpanHandle, Tracer, TracerStats};

pub use glimmer_protocol::*;
