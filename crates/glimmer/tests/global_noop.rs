//! Pre-initialization behavior of the global accessor.
//!
//! `glimmer::init` is deliberately never called in this test binary: every
//! handle must be the inert stand-in.

use glimmer::SpanStatus;

#[test]
fn uninitialized_tracer_hands_out_inert_spans() {
    let tracer = glimmer::tracer();
    assert!(!tracer.is_initialized());
    assert!(tracer.get().is_none());

    let span = tracer.span("search").with_attribute("search.query", "moby dick").start();
    assert_eq!(span.trace_id().to_hex(), "0".repeat(32));
    assert_eq!(span.span_id().to_hex(), "0".repeat(16));

    // The full handle contract holds, as no-ops
    span.set_attribute("search.method", "tfidf");
    span.set_status(SpanStatus::Error);
    span.end();
    span.end();
}

#[tokio::test]
async fn uninitialized_in_span_still_runs_the_future() {
    let tracer = glimmer::tracer();
    let result: Result<u32, std::io::Error> = tracer.in_span("untraced", async { Ok(7) }).await;
    assert_eq!(result.unwrap(), 7);
}
