//! Lightweight admin HTTP server
//!
//! Exposes `/healthz` and `/metrics` on a separate listener, with metrics provided by caller.

use axum::http::StatusCode;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

async fn healthz() -> &'static str { "OK" }

/// Router serving the admin endpoints; metrics come from `metrics_fn`.
pub fn admin_router(metrics_fn: fn() -> (StatusCode, String)) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(move || async move { metrics_fn() }))
}

/// Bind `addr` and serve the admin router on the current runtime.
/// Bind errors are returned; serve errors are logged by the spawned task.
pub async fn spawn_admin_server(
    addr: &str,
    metrics_fn: fn() -> (StatusCode, String),
) -> anyhow::Result<JoinHandle<()>> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind admin listener {addr}: {e}"))?;
    let local = listener.local_addr()?;
    info!(addr = %local, "admin server listening");
    let router = admin_router(metrics_fn);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "admin server stopped");
        }
    }))
}
