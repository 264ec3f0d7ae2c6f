use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, IntCounter, IntCounterVec, Registry,
    TextEncoder,
};

use crate::error::{AppError, Result};

/// Frontend metrics, registered on a registry owned by this struct rather
/// than the prometheus default registry.
#[derive(Clone)]
pub struct FrontendMetrics {
    pub request_count: IntCounter,
    pub failed_requests: IntCounter,
    pub phrase_counter: IntCounterVec,
    pub phrase_request_latency: Histogram,
    pub render_latency: Histogram,

    registry: Registry,
}

impl FrontendMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let request_count = register_int_counter_with_registry!(
            "frontend_request_count",
            "Total number of requests",
            registry
        )?;

        let failed_requests = register_int_counter_with_registry!(
            "frontend_failed_requests",
            "Number of failed requests",
            registry
        )?;

        let phrase_counter = register_int_counter_vec_with_registry!(
            "frontend_phrase_counter",
            "Count of each phrase",
            &["phrase"],
            registry
        )?;

        let phrase_request_latency = register_histogram_with_registry!(
            "phrase_request_latency_seconds",
            "Time taken to serve a phrase request, including the backend call",
            registry
        )?;

        let render_latency = register_histogram_with_registry!(
            "render_latency_seconds",
            "Time taken to render the landing page",
            registry
        )?;

        Ok(Self {
            request_count,
            failed_requests,
            phrase_counter,
            phrase_request_latency,
            render_latency,
            registry,
        })
    }

    pub fn observe_phrase(&self, phrase: &str) {
        self.phrase_counter.with_label_values(&[phrase]).inc();
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| AppError::Internal(format!("Metrics output is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_all_metric_names() {
        let metrics = FrontendMetrics::new().unwrap();
        metrics.request_count.inc();
        metrics.failed_requests.inc();
        metrics.observe_phrase("Ship it.");
        metrics.phrase_request_latency.observe(0.01);
        metrics.render_latency.observe(0.002);

        let output = metrics.export().unwrap();
        assert!(output.contains("frontend_request_count 1"));
        assert!(output.contains("frontend_failed_requests 1"));
        assert!(output.contains("frontend_phrase_counter{phrase=\"Ship it.\"} 1"));
        assert!(output.contains("phrase_request_latency_seconds_count 1"));
        assert!(output.contains("render_latency_seconds_count 1"));
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let first = FrontendMetrics::new().unwrap();
        let second = FrontendMetrics::new().unwrap();
        first.request_count.inc();

        assert_eq!(first.request_count.get(), 1);
        assert_eq!(second.request_count.get(), 0);
    }
}
