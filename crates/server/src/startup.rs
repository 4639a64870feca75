use std::net::SocketAddr;

use axum::Router;
use common::{admin_http::spawn_admin_server, metrics::encode_metrics};
use configs::AppConfig;
use service::{ServiceSettings, Services};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

pub fn settings_from(cfg: &AppConfig) -> ServiceSettings {
    ServiceSettings { max_bulk: cfg.store.max_bulk, audit_capacity: cfg.store.audit_capacity }
}

/// Build the services for `cfg`, seeding demo records when asked to.
pub async fn build_services(cfg: &AppConfig) -> Result<Services, StartupError> {
    let services = Services::new(settings_from(cfg));
    if cfg.store.seed_demo_data {
        services.seed_demo_data().await?;
    }
    Ok(services)
}

/// Router with default CORS for the given services.
pub fn build_app(services: &Services) -> Router {
    routes::build_router(services, build_cors())
}

/// Public entry: build the app from `cfg` and serve it until the listener fails.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    let addr: SocketAddr = cfg
        .bind_addr()
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address {}: {e}", cfg.bind_addr())))?;

    let services = build_services(&cfg).await?;
    let app = build_app(&services);

    if let Some(admin_addr) = &cfg.server.admin_addr {
        // 管理端口启动失败不影响主服务
        if let Err(e) = spawn_admin_server(admin_addr, encode_metrics).await {
            warn!(error = %e, "admin server not started");
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    info!(%addr, max_bulk = cfg.store.max_bulk, seeded = cfg.store.seed_demo_data, "inventory api listening");
    axum::serve(listener, app).await.map_err(anyhow::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_follows_config() {
        let mut cfg = AppConfig::default();
        assert_eq!(build_services(&cfg).await.unwrap().items.count().await, 0);
        cfg.store.seed_demo_data = true;
        cfg.store.max_bulk = 5;
        let services = build_services(&cfg).await.unwrap();
        assert_eq!(services.items.count().await, 3);
        assert_eq!(services.items.settings().max_bulk, 5);
    }
}
