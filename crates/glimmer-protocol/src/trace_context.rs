use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Fill `buf` from the OS entropy source, with a time-seeded xorshift
/// fallback when that source is unavailable.
fn fill_random(buf: &mut [u8]) {
    if getrandom::getrandom(buf).is_ok() {
        return;
    }

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut state = (nanos ^ counter.wrapping_mul(0x9e3779b97f4a7c15)) | 1;
    for byte in buf {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        *byte = (state >> 24) as u8;
    }
}

/// 16-byte trace ID (128 bits), shared by every span of one logical operation
#[derive(Clone, Copy, Hash, Eq, PartialEq)]
pub struct TraceId(pub [u8; 16]);

impl TraceId {
    /// Generate a new random trace ID
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        fill_random(&mut bytes);
        Self(bytes)
    }

    /// Parse from hex string (W3C format: 32 hex chars)
    pub fn from_hex(s: &str) -> Result<Self, TraceContextError> {
        if s.len() != 32 {
            return Err(TraceContextError::InvalidLength {
                expected: 32,
                found: s.len(),
            });
        }
        let bytes = hex::decode(s).map_err(|_| TraceContextError::InvalidHex)?;
        Ok(Self(bytes.try_into().unwrap()))
    }

    /// Format as lowercase hex, zero-padded to 32 chars
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self.to_hex())
    }
}

/// 8-byte span ID (64 bits), unique to one span
#[derive(Clone, Copy, Hash, Eq, PartialEq)]
pub struct SpanId(pub [u8; 8]);

impl SpanId {
    /// Generate a new random span ID
    pub fn random() -> Self {
        let mut bytes = [0u8; 8];
        fill_random(&mut bytes);
        Self(bytes)
    }

    /// Parse from hex string (W3C format: 16 hex chars)
    pub fn from_hex(s: &str) -> Result<Self, TraceContextError> {
        if s.len() != 16 {
            return Err(TraceContextError::InvalidLength {
                expected: 16,
                found: s.len(),
            });
        }
        let bytes = hex::decode(s).map_err(|_| TraceContextError::InvalidHex)?;
        Ok(Self(bytes.try_into().unwrap()))
    }

    /// Format as lowercase hex, zero-padded to 16 chars
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({})", self.to_hex())
    }
}

/// W3C traceparent identity: "00-{trace_id}-{span_id}-{flags}"
#[derive(Clone, Debug)]
pub struct TraceContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub flags: u8,
}

/// Sampled flag, always set on contexts this crate mints
pub const FLAG_SAMPLED: u8 = 0x01;

impl TraceContext {
    /// Create a new root trace context (fresh trace id, sampled)
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::random(),
            span_id: SpanId::random(),
            parent_span_id: None,
            flags: FLAG_SAMPLED,
        }
    }

    /// Create a child context in the same trace
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: SpanId::random(),
            parent_span_id: Some(self.span_id),
            flags: self.flags,
        }
    }

    /// Parse from a W3C traceparent header
    pub fn from_traceparent(header: &str) -> Result<Self, TraceContextError> {
        let parts: Vec<&str> = header.split('-').collect();
        if parts.len() != 4 {
            return Err(TraceContextError::InvalidFormat);
        }

        if parts[0] != "00" {
            return Err(TraceContextError::UnsupportedVersion);
        }

        let trace_id = TraceId::from_hex(parts[1])?;
        let span_id = SpanId::from_hex(parts[2])?;
        let flags = u8::from_str_radix(parts[3], 16).map_err(|_| TraceContextError::InvalidHex)?;

        Ok(Self {
            trace_id,
            span_id,
            parent_span_id: None,
            flags,
        })
    }

    /// Format as a W3C traceparent header
    pub fn to_traceparent(&self) -> String {
        format!(
            "00-{}-{}-{:02x}",
            self.trace_id.to_hex(),
            self.span_id.to_hex(),
            self.flags
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TraceContextError {
    #[error("invalid traceparent format")]
    InvalidFormat,
    #[error("unsupported trace context version")]
    UnsupportedVersion,
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("invalid id length: expected {expected} hex chars, found {found}")]
    InvalidLength { expected: usize, found: usize },
}
