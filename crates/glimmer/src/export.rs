//! Best-effort span delivery to the collector.
//!
//! Export is fire-and-forget: `end` hands the finished span over and returns
//! immediately. Delivery failures are logged with a truncated trace id and
//! no payload, and are never visible to the span's caller.

use std::sync::atomic::{AtomicU64, Ordering};

use glimmer_protocol::{
    ExportEnvelope, InstrumentationScope, ResourceInfo, Span, TraceId, TELEMETRY_SDK_VERSION,
};

use crate::config::TracerConfig;

#[derive(Debug, thiserror::Error)]
enum ExportError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("collector returned {0}")]
    Status(reqwest::StatusCode),
}

pub(crate) struct Exporter {
    client: reqwest::Client,
    endpoint: String,
    resource: ResourceInfo,
    scope: InstrumentationScope,
    attempts: AtomicU64,
}

impl Exporter {
    pub(crate) fn new(config: &TracerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.resolved_collector_url(),
            resource: ResourceInfo {
                service_name: config.service_name.clone(),
                service_version: config.service_version.clone(),
                environment: config.environment.clone(),
            },
            scope: InstrumentationScope {
                name: "glimmer".to_string(),
                version: TELEMETRY_SDK_VERSION.to_string(),
            },
            attempts: AtomicU64::new(0),
        }
    }

    /// Hand a finished span off for delivery. Never fails, never blocks.
    pub(crate) fn export(&self, span: Span, duration_ms: u64) {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let envelope = ExportEnvelope::for_span(&self.resource, &self.scope, &span);
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let service = self.resource.service_name.clone();
        let span_name = span.name;
        let trace_id = truncated(&span.trace_id);

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                // No runtime to deliver on: record locally instead
                fallback_record(&service, &span_name, &trace_id, duration_ms, "no async runtime");
                return;
            }
        };

        handle.spawn(async move {
            match send(&client, &endpoint, &envelope).await {
                Ok(()) => {
                    tracing::debug!(
                        service = %service,
                        span = %span_name,
                        trace_id = %trace_id,
                        duration_ms,
                        endpoint = %endpoint,
                        "span exported"
                    );
                }
                Err(error) => {
                    fallback_record(&service, &span_name, &trace_id, duration_ms, &error.to_string());
                }
            }
        });
    }

    pub(crate) fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

async fn send(
    client: &reqwest::Client,
    endpoint: &str,
    envelope: &ExportEnvelope,
) -> Result<(), ExportError> {
    let response = client.post(endpoint).json(envelope).send().await?;
    if !response.status().is_success() {
        return Err(ExportError::Status(response.status()));
    }
    Ok(())
}

/// The local-only record of a span that could not be delivered: truncated
/// trace id, no payload.
fn fallback_record(service: &str, span_name: &str, trace_id: &str, duration_ms: u64, reason: &str) {
    tracing::warn!(
        service = %service,
        span = %span_name,
        trace_id = %trace_id,
        duration_ms,
        reason = %reason,
        "span export failed, recorded locally"
    );
}

fn truncated(trace_id: &TraceId) -> String {
    let hex = trace_id.to_hex();
    format!("{}...", &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_protocol::TraceContext;

    #[test]
    fn truncation_redacts_most_of_the_trace_id() {
        let context = TraceContext::new_root();
        let short = truncated(&context.trace_id);
        assert_eq!(short.len(), 11);
        assert!(context.trace_id.to_hex().starts_with(&short[..8]));
    }
}
