//! The JSON document one finished span is exported as.
//!
//! Field names and nesting follow the OTLP/HTTP JSON trace payload and must
//! stay bit-exact for collector compatibility: `resourceSpans` → `resource` +
//! `scopeSpans` → `scope` + `spans`, nanosecond timestamps as decimal
//! strings, every attribute value flattened to a `stringValue`.

use serde::{Deserialize, Serialize};

use crate::span::{Span, SpanStatus};

pub const SPAN_KIND_CLIENT: &str = "SPAN_KIND_CLIENT";
pub const STATUS_CODE_OK: &str = "STATUS_CODE_OK";
pub const STATUS_CODE_ERROR: &str = "STATUS_CODE_ERROR";

pub const TELEMETRY_SDK_NAME: &str = "glimmer";
pub const TELEMETRY_SDK_LANGUAGE: &str = "rust";
pub const TELEMETRY_SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resource-level identity stamped on every envelope
#[derive(Clone, Debug)]
pub struct ResourceInfo {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub resource_spans: Vec<ResourceSpans>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpans {
    pub resource: Resource,
    pub scope_spans: Vec<ScopeSpans>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

impl KeyValue {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AnyValue {
                string_value: value.into(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValue {
    pub string_value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScopeSpans {
    pub scope: InstrumentationScope,
    pub spans: Vec<SpanEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstrumentationScope {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanEntry {
    pub trace_id: String,
    pub span_id: String,
    pub name: String,
    pub kind: String,
    pub start_time_unix_nano: String,
    pub end_time_unix_nano: String,
    pub attributes: Vec<KeyValue>,
    pub status: StatusEntry,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusEntry {
    pub code: String,
}

impl ExportEnvelope {
    /// Build the envelope for one finished span.
    ///
    /// `end_time` falls back to `start_time` for a span that was somehow
    /// never stamped; callers only hand over closed spans.
    pub fn for_span(resource: &ResourceInfo, scope: &InstrumentationScope, span: &Span) -> Self {
        let end_time = span.end_time.unwrap_or(span.start_time);

        let attributes = span
            .attributes
            .iter()
            .map(|(key, value)| KeyValue::string(key, value.to_string()))
            .collect();

        let status_code = match span.status {
            SpanStatus::Ok => STATUS_CODE_OK,
            SpanStatus::Error => STATUS_CODE_ERROR,
        };

        Self {
            resource_spans: vec![ResourceSpans {
                resource: Resource {
                    attributes: vec![
                        KeyValue::string("service.name", &resource.service_name),
                        KeyValue::string("service.version", &resource.service_version),
                        KeyValue::string("deployment.environment", &resource.environment),
                        KeyValue::string("telemetry.sdk.name", TELEMETRY_SDK_NAME),
                        KeyValue::string("telemetry.sdk.language", TELEMETRY_SDK_LANGUAGE),
                        KeyValue::string("telemetry.sdk.version", TELEMETRY_SDK_VERSION),
                    ],
                },
                scope_spans: vec![ScopeSpans {
                    scope: scope.clone(),
                    spans: vec![SpanEntry {
                        trace_id: span.trace_id.to_hex(),
                        span_id: span.span_id.to_hex(),
                        name: span.name.clone(),
                        kind: SPAN_KIND_CLIENT.to_string(),
                        start_time_unix_nano: span.start_time.as_nanos().to_string(),
                        end_time_unix_nano: end_time.as_nanos().to_string(),
                        attributes,
                        status: StatusEntry {
                            code: status_code.to_string(),
                        },
                    }],
                }],
            }],
        }
    }
}
