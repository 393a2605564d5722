//! Storage bridge metrics.
//!
//! Counters and histograms for:
//! - Dropbox API requests by endpoint and status
//! - Public URL resolution outcomes
//! - Derivation trigger results

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total Dropbox API requests by endpoint and status.
    pub const REQUESTS_TOTAL: &str = "dbx_requests_total";

    /// Dropbox API request latency in seconds by endpoint.
    pub const LATENCY_SECONDS: &str = "dbx_request_latency_seconds";

    /// Public URL resolutions by outcome.
    pub const PUBLIC_URL_TOTAL: &str = "dbx_public_url_total";

    /// Derivation trigger calls by HTTP status (or `error`).
    pub const DERIVATION_TRIGGER_TOTAL: &str = "dbx_derivation_trigger_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a completed Dropbox API request. A status of 0 means no response.
pub fn record_request(endpoint: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "endpoint" => endpoint.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record the outcome of a public URL resolution.
pub fn record_resolution(outcome: &'static str) {
    counter!(names::PUBLIC_URL_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a derivation trigger call; `None` means a transport failure.
pub fn record_trigger(status: Option<u16>) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
    counter!(names::DERIVATION_TRIGGER_TOTAL, "status" => status).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::PUBLIC_URL_TOTAL.starts_with("dbx_"));
        assert!(names::DERIVATION_TRIGGER_TOTAL.contains("trigger"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("files/get_metadata", 200, 12.5);
        record_resolution("existing");
        record_trigger(None);
        record_trigger(Some(200));
    }
}
