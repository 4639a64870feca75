//! Shared building blocks for the inventory API crates:
//! response types, logging setup and the Prometheus/health admin endpoint.

pub mod types;
pub mod utils;
pub mod metrics;
pub mod admin_http;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn error_body_serializes_error_field() {
        let body = types::ErrorBody::new("Item with id 9 not found");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Item with id 9 not found"}));
    }
}
