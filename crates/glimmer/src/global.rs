//! Process-wide tracer lifecycle.
//!
//! [`init`] constructs the single shared [`Tracer`] at most once; [`tracer`]
//! is the convenience accessor backed by it. Before [`init`] runs, [`tracer`]
//! returns a stand-in whose spans are inert no-ops, so call sites never
//! branch on initialization state. Dependency injection remains first-class:
//! `Tracer::new` is public and collaborators can hold their own handle.

use once_cell::sync::OnceCell;

use crate::config::TracerConfig;
use crate::tracer::{SpanBuilder, Tracer};

static GLOBAL: OnceCell<Tracer> = OnceCell::new();

/// Initialize the process-wide tracer.
///
/// The first call constructs the instance; later calls return the existing
/// one and ignore their config.
pub fn init(config: TracerConfig) -> Tracer {
    let mut constructed = false;
    let tracer = GLOBAL.get_or_init(|| {
        constructed = true;
        Tracer::new(config)
    });
    if constructed {
        tracing::info!(
            service = %tracer.config().service_name,
            environment = %tracer.config().environment,
            collector = %tracer.config().resolved_collector_url(),
            "🚀 glimmer tracing initialized"
        );
    } else {
        tracing::debug!("glimmer tracing already initialized, reusing existing tracer");
    }
    tracer.clone()
}

/// The process-wide tracer, or an inert stand-in before [`init`]
pub fn tracer() -> TracerRef {
    match GLOBAL.get() {
        Some(tracer) => TracerRef {
            inner: Some(tracer.clone()),
        },
        None => {
            tracing::warn!("tracer not initialized, spans will be dropped (call glimmer::init first)");
            TracerRef { inner: None }
        }
    }
}

/// A handle that is either backed by the global tracer or fully inert.
///
/// The inert form implements the same surface with no-ops, as the null-object
/// counterpart of [`Tracer`].
#[derive(Clone)]
pub struct TracerRef {
    inner: Option<Tracer>,
}

impl TracerRef {
    /// Start building a span; inert when the tracer is uninitialized
    pub fn span(&self, name: impl Into<String>) -> SpanBuilder {
        match &self.inner {
            Some(tracer) => tracer.span(name),
            None => SpanBuilder::detached(name),
        }
    }

    /// Run a future inside a span (see [`Tracer::in_span`]); without an
    /// initialized tracer the future simply runs untraced
    pub async fn in_span<F, T, E>(&self, name: impl Into<String>, future: F) -> Result<T, E>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: std::error::Error,
    {
        match &self.inner {
            Some(tracer) => tracer.in_span(name, future).await,
            None => future.await,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.is_some()
    }

    /// The backing tracer, when initialized
    pub fn get(&self) -> Option<&Tracer> {
        self.inner.as_ref()
    }
}
