//! Traced search flow against a Gutenberg-style search API.
//!
//! Expects the search backend on localhost:8000 and an OTLP collector on
//! localhost:4318. Both are optional: an unreachable backend shows up as an
//! error span, an unreachable collector as local fallback records.
//!
//! ```sh
//! cargo run --example search_client -- "moby dick"
//! ```

use std::time::Duration;

use anyhow::Result;
use glimmer::{TracedClient, TracerConfig};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
    total_results: u64,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct SearchResult {
    id: i64,
    title: String,
    author: String,
    snippet: String,
    score: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let tracer = glimmer::init(
        TracerConfig::new("gutenberg-search-frontend").with_environment("development"),
    );
    let client = TracedClient::new(tracer.clone());

    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "moby dick".to_string());

    let span = tracer
        .span("frontend_search")
        .with_attribute("search.query", query.as_str())
        .with_attribute("search.method", "tfidf")
        .with_attribute("user.action", "search_submit")
        .start();

    let result = client
        .get("http://localhost:8000/search")
        .query(&[("q", query.as_str()), ("method", "tfidf")])
        .with_parent(span.context())
        .send()
        .await;

    match result {
        Ok(response) => match response.json::<SearchResponse>().await {
            Ok(data) => {
                span.set_attributes([
                    ("search.success", glimmer::AttributeValue::Bool(true)),
                    (
                        "search.results_count",
                        glimmer::AttributeValue::Int(data.total_results as i64),
                    ),
                ]);
                println!("{} result(s) for {query:?}", data.total_results);
                if let Some(top) = data.results.first() {
                    span.set_attributes([
                        ("search.top_result.title", top.title.as_str()),
                        ("search.top_result.author", top.author.as_str()),
                    ]);
                    println!("top hit: {:?} by {} ({:.4})", top.title, top.author, top.score);
                }
            }
            Err(error) => {
                span.record_exception(&error);
                eprintln!("response was not valid search JSON: {error}");
            }
        },
        Err(error) => {
            span.record_exception(&error);
            span.set_attribute("search.success", false);
            eprintln!("search request failed: {error}");
        }
    }

    span.end();

    // Give the fire-and-forget export a moment before the process exits
    tokio::time::sleep(Duration::from_millis(300)).await;
    Ok(())
}
