use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::trace_context::{SpanId, TraceId};

/// Wall-clock timestamp in milliseconds since the UNIX epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnixMillis(pub u64);

impl UnixMillis {
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(millis)
    }

    /// Nanosecond scale, as the export envelope carries it
    pub fn as_nanos(&self) -> u64 {
        self.0 * 1_000_000
    }
}

/// Attribute value: a closed set of scalar types, coerced to a string at
/// export time
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{s}"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Int(v as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

/// Span completion status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpanStatus {
    #[default]
    Ok,
    Error,
}

/// One traced operation: open while `end_time` is unset, finished after
#[derive(Clone, Debug)]
pub struct Span {
    pub name: String,
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub start_time: UnixMillis,
    pub end_time: Option<UnixMillis>,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub status: SpanStatus,
}

impl Span {
    /// Set or overwrite one attribute
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Span duration in milliseconds, once ended
    pub fn duration_ms(&self) -> Option<u64> {
        self.end_time.map(|end| end.0.saturating_sub(self.start_time.0))
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace_context::TraceContext;

    fn open_span(name: &str) -> Span {
        let context = TraceContext::new_root();
        Span {
            name: name.to_string(),
            trace_id: context.trace_id,
            span_id: context.span_id,
            parent_span_id: None,
            start_time: UnixMillis::now(),
            end_time: None,
            attributes: BTreeMap::new(),
            status: SpanStatus::default(),
        }
    }

    #[test]
    fn later_attribute_writes_overwrite() {
        let mut span = open_span("attrs");
        span.set_attribute("search.query", "moby");
        span.set_attribute("search.query", "moby dick");
        assert_eq!(
            span.attributes.get("search.query"),
            Some(&AttributeValue::String("moby dick".to_string()))
        );
        assert_eq!(span.attributes.len(), 1);
    }

    #[test]
    fn duration_is_end_minus_start() {
        let mut span = open_span("timed");
        assert!(span.is_open());
        assert_eq!(span.duration_ms(), None);

        span.start_time = UnixMillis(1_000);
        span.end_time = Some(UnixMillis(1_250));
        assert!(!span.is_open());
        assert_eq!(span.duration_ms(), Some(250));
    }

    #[test]
    fn duration_never_underflows() {
        let mut span = open_span("skewed");
        span.start_time = UnixMillis(2_000);
        span.end_time = Some(UnixMillis(1_999));
        assert_eq!(span.duration_ms(), Some(0));
    }

    #[test]
    fn attribute_values_coerce_to_strings() {
        assert_eq!(AttributeValue::from("tfidf").to_string(), "tfidf");
        assert_eq!(AttributeValue::from(200i64).to_string(), "200");
        assert_eq!(AttributeValue::from(true).to_string(), "true");
        assert_eq!(AttributeValue::from(0.5f64).to_string(), "0.5");
    }

    #[test]
    fn status_defaults_to_ok() {
        assert_eq!(SpanStatus::default(), SpanStatus::Ok);
    }
}
