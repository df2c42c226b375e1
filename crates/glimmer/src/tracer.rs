use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glimmer_protocol::{
    AttributeValue, Span, SpanId, SpanStatus, TraceContext, TraceId, UnixMillis,
};

use crate::config::TracerConfig;
use crate::export::Exporter;
use crate::registry::SpanRegistry;

/// Main entry point for creating and closing spans.
///
/// Cheap to clone; all clones share one registry and exporter.
#[derive(Clone)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

struct TracerInner {
    config: TracerConfig,
    registry: SpanRegistry,
    exporter: Exporter,
    spans_started: AtomicU64,
}

impl Tracer {
    pub fn new(config: TracerConfig) -> Self {
        let exporter = Exporter::new(&config);
        Self {
            inner: Arc::new(TracerInner {
                config,
                registry: SpanRegistry::new(),
                exporter,
                spans_started: AtomicU64::new(0),
            }),
        }
    }

    /// Start building a new span
    pub fn span(&self, name: impl Into<String>) -> SpanBuilder {
        SpanBuilder {
            name: name.into(),
            attributes: BTreeMap::new(),
            parent: None,
            tracer: Some(self.clone()),
        }
    }

    /// End an open span: stamp the end time, log the outcome, hand the
    /// record to the exporter, remove it from the registry.
    ///
    /// Idempotent: a second call for the same id, or a call with an unknown
    /// id, is a silent no-op.
    pub fn end_span(&self, span_id: SpanId) {
        let Some(mut span) = self.inner.registry.remove(&span_id) else {
            return;
        };

        let mut end_time = UnixMillis::now();
        if end_time < span.start_time {
            end_time = span.start_time;
        }
        span.end_time = Some(end_time);
        let duration_ms = span.duration_ms().unwrap_or(0);

        tracing::debug!(
            service = %self.inner.config.service_name,
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            duration_ms,
            status = ?span.status,
            "span ended: {}",
            span.name
        );

        self.inner.exporter.export(span, duration_ms);
    }

    /// Merge attributes into an open span; no-op if unknown/closed
    pub fn set_attributes<K, V>(&self, span_id: SpanId, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        self.inner.registry.update(&span_id, |span| {
            for (key, value) in attributes {
                span.set_attribute(key, value);
            }
        });
    }

    /// Record a traced-operation failure on an open span: status goes to
    /// `Error` and the error's type and message land in the attributes. Does
    /// not end the span.
    pub fn record_exception<E: std::error::Error>(&self, span_id: SpanId, error: &E) {
        let name = std::any::type_name::<E>();
        let message = error.to_string();
        self.inner.registry.update(&span_id, |span| {
            span.set_attribute("error.name", name);
            span.set_attribute("error.message", message.as_str());
            span.status = SpanStatus::Error;
        });
    }

    /// Direct status override; no-op if unknown/closed
    pub fn set_status(&self, span_id: SpanId, status: SpanStatus) {
        self.inner.registry.update(&span_id, |span| {
            span.status = status;
        });
    }

    /// Run a future inside a span: an `Err` is recorded as an exception, the
    /// span always ends, and the result passes through unchanged.
    pub async fn in_span<F, T, E>(&self, name: impl Into<String>, future: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::error::Error,
    {
        let span = self.span(name).start();
        match future.await {
            Ok(value) => {
                span.end();
                Ok(value)
            }
            Err(error) => {
                span.record_exception(&error);
                span.end();
                Err(error)
            }
        }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> TracerStats {
        TracerStats {
            spans_started: self.inner.spans_started.load(Ordering::Relaxed),
            open_spans: self.inner.registry.open_count(),
            export_attempts: self.inner.exporter.attempts(),
        }
    }
}

/// Observability counters for the tracer itself
#[derive(Clone, Debug)]
pub struct TracerStats {
    pub spans_started: u64,
    /// Spans started but not yet ended. A span that is never ended stays
    /// here indefinitely; this counter is how that shows up.
    pub open_spans: usize,
    pub export_attempts: u64,
}

/// Builder for creating and starting spans
pub struct SpanBuilder {
    name: String,
    attributes: BTreeMap<String, AttributeValue>,
    parent: Option<TraceContext>,
    tracer: Option<Tracer>,
}

impl SpanBuilder {
    /// A builder with no tracer behind it; `start` yields an inert handle.
    pub(crate) fn detached(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            parent: None,
            tracer: None,
        }
    }

    /// Add an attribute to the span
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the parent context: the span joins that trace instead of
    /// starting a new one
    pub fn with_parent(mut self, parent: &TraceContext) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Start the span. Always succeeds.
    pub fn start(self) -> SpanHandle {
        let Some(tracer) = self.tracer else {
            return SpanHandle::inert();
        };

        let context = match &self.parent {
            Some(parent) => parent.child(),
            None => TraceContext::new_root(),
        };

        let span = Span {
            name: self.name,
            trace_id: context.trace_id,
            span_id: context.span_id,
            parent_span_id: context.parent_span_id,
            start_time: UnixMillis::now(),
            end_time: None,
            attributes: self.attributes,
            status: SpanStatus::Ok,
        };

        tracing::debug!(
            service = %tracer.inner.config.service_name,
            trace_id = %context.trace_id,
            span_id = %context.span_id,
            attributes = ?span.attributes,
            "span started: {}",
            span.name
        );

        tracer.inner.registry.insert(span);
        tracer.inner.spans_started.fetch_add(1, Ordering::Relaxed);

        SpanHandle {
            context,
            tracer: Some(tracer),
        }
    }
}

/// Handle to an open span.
///
/// Every operation forwards to the owning tracer keyed by span id, so a
/// handle that outlives its span (or an inert pre-initialization handle)
/// degrades to no-ops rather than errors.
#[derive(Clone)]
pub struct SpanHandle {
    context: TraceContext,
    tracer: Option<Tracer>,
}

impl SpanHandle {
    pub(crate) fn inert() -> Self {
        Self {
            context: TraceContext {
                trace_id: TraceId([0; 16]),
                span_id: SpanId([0; 8]),
                parent_span_id: None,
                flags: 0,
            },
            tracer: None,
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.context.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.context.span_id
    }

    /// The context to propagate to downstream calls
    pub fn context(&self) -> &TraceContext {
        &self.context
    }

    /// End the span; idempotent
    pub fn end(&self) {
        if let Some(tracer) = &self.tracer {
            tracer.end_span(self.context.span_id);
        }
    }

    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        if let Some(tracer) = &self.tracer {
            let pair: (String, AttributeValue) = (key.into(), value.into());
            tracer.set_attributes(self.context.span_id, [pair]);
        }
    }

    pub fn set_attributes<K, V>(&self, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        if let Some(tracer) = &self.tracer {
            tracer.set_attributes(self.context.span_id, attributes);
        }
    }

    pub fn record_exception<E: std::error::Error>(&self, error: &E) {
        if let Some(tracer) = &self.tracer {
            tracer.record_exception(self.context.span_id, error);
        }
    }

    pub fn set_status(&self, status: SpanStatus) {
        if let Some(tracer) = &self.tracer {
            tracer.set_status(self.context.span_id, status);
        }
    }
}
