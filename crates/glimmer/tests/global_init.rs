//! Initialize-once semantics of the global tracer.

use glimmer::TracerConfig;

#[tokio::test]
async fn init_constructs_once_and_backs_the_accessor() {
    let first = glimmer::init(
        TracerConfig::new("first-service").with_collector_url("http://127.0.0.1:9/v1/traces"),
    );

    // A second init keeps the original instance; its config is ignored
    let second = glimmer::init(
        TracerConfig::new("second-service").with_collector_url("http://127.0.0.1:9/v1/traces"),
    );
    assert_eq!(second.config().service_name, "first-service");

    // The accessor is backed by that same instance
    let shared = glimmer::tracer();
    assert!(shared.is_initialized());
    let span = shared.span("via_accessor").start();
    assert_eq!(first.stats().open_spans, 1);
    span.end();
    assert_eq!(first.stats().open_spans, 0);
    assert_eq!(first.stats().export_attempts, 1);
}
