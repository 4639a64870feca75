use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

use crate::errors::ServiceError;

// Prometheus metrics (default registry)
pub static ENTITY_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "inventory_entity_operations_total",
        "Entity service operations by entity, operation and outcome",
        &["entity", "operation", "outcome"]
    )
    .expect("register entity_operations_total")
});

/// Count one operation; the outcome label is `ok` or the error kind.
pub fn observe<T>(entity: &str, operation: &str, result: &Result<T, ServiceError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    ENTITY_OPERATIONS_TOTAL
        .with_label_values(&[entity, operation, outcome])
        .inc();
}
