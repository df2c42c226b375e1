use dashmap::DashMap;
use glimmer_protocol::{Span, SpanId};

/// Registry of open spans, keyed by span id.
///
/// A span lives here from `start` until `end`; removal on end is what makes
/// a second end call a no-op. Keying by span id (rather than a call stack)
/// lets independent overlapping operations each close at their own time.
pub(crate) struct SpanRegistry {
    spans: DashMap<SpanId, Span>,
}

impl SpanRegistry {
    pub(crate) fn new() -> Self {
        Self {
            spans: DashMap::new(),
        }
    }

    pub(crate) fn insert(&self, span: Span) {
        self.spans.insert(span.span_id, span);
    }

    /// Remove and return the span, if it is still open
    pub(crate) fn remove(&self, span_id: &SpanId) -> Option<Span> {
        self.spans.remove(span_id).map(|(_, span)| span)
    }

    /// Mutate an open span in place; returns false for unknown/closed ids
    pub(crate) fn update(&self, span_id: &SpanId, f: impl FnOnce(&mut Span)) -> bool {
        match self.spans.get_mut(span_id) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    pub(crate) fn open_count(&self) -> usize {
        self.spans.len()
    }
}
