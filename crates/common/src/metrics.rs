//! Prometheus text exposition of the default registry.

use axum::http::StatusCode;
use prometheus::{Encoder, TextEncoder};

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{register_int_counter, IntCounter};

    #[test]
    fn encodes_registered_counters() {
        let c: IntCounter = register_int_counter!("common_metrics_test_total", "test counter").unwrap();
        c.inc();
        let (status, body) = encode_metrics();
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("common_metrics_test_total 1"));
    }
}
