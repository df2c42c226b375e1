//! Tracer configuration.
//!
//! Every field has an environment-variable fallback so a deployed frontend
//! can be pointed at a different collector without a rebuild.

/// Service name override, like the container orchestrator would set it
pub const ENV_SERVICE_NAME: &str = "GLIMMER_SERVICE_NAME";
/// Deployment environment override ("development", "production", ...)
pub const ENV_ENVIRONMENT: &str = "GLIMMER_ENVIRONMENT";
/// Collector endpoint override, wins over the environment-keyed default
pub const ENV_COLLECTOR_URL: &str = "GLIMMER_COLLECTOR_URL";

/// OTLP/HTTP trace endpoint for local development (port-forwarded agent)
pub const LOCAL_COLLECTOR_URL: &str = "http://localhost:4318/v1/traces";
/// Cluster-internal OTLP/HTTP trace endpoint
pub const CLUSTER_COLLECTOR_URL: &str =
    "http://otel-collector.monitoring.svc.cluster.local:4318/v1/traces";

#[derive(Clone, Debug)]
pub struct TracerConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    /// Explicit collector endpoint; `None` selects by environment
    pub collector_url: Option<String>,
}

impl TracerConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: "1.0.0".to_string(),
            environment: std::env::var(ENV_ENVIRONMENT)
                .unwrap_or_else(|_| "development".to_string()),
            collector_url: std::env::var(ENV_COLLECTOR_URL).ok(),
        }
    }

    /// Detect the service name from the environment, or fall back to
    /// "unknown"
    pub fn from_env() -> Self {
        let service_name =
            std::env::var(ENV_SERVICE_NAME).unwrap_or_else(|_| "unknown".to_string());
        Self::new(service_name)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_collector_url(mut self, url: impl Into<String>) -> Self {
        self.collector_url = Some(url.into());
        self
    }

    /// The endpoint exports go to: the explicit override when set, otherwise
    /// localhost in development and the cluster-internal agent everywhere
    /// else.
    pub fn resolved_collector_url(&self) -> String {
        match &self.collector_url {
            Some(url) => url.clone(),
            None if self.environment == "development" => LOCAL_COLLECTOR_URL.to_string(),
            None => CLUSTER_COLLECTOR_URL.to_string(),
        }
    }
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_selection_follows_environment() {
        let dev = TracerConfig::new("svc").with_environment("development");
        let prod = TracerConfig::new("svc").with_environment("production");
        // Guard against ambient env leaking into the assertion
        let dev = TracerConfig { collector_url: None, ..dev };
        let prod = TracerConfig { collector_url: None, ..prod };
        assert_eq!(dev.resolved_collector_url(), LOCAL_COLLECTOR_URL);
        assert_eq!(prod.resolved_collector_url(), CLUSTER_COLLECTOR_URL);
    }

    #[test]
    fn explicit_collector_url_wins() {
        let config = TracerConfig::new("svc")
            .with_environment("production")
            .with_collector_url("http://127.0.0.1:9999/v1/traces");
        assert_eq!(
            config.resolved_collector_url(),
            "http://127.0.0.1:9999/v1/traces"
        );
    }
}
