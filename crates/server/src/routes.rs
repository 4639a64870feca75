use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::{metrics::encode_metrics, types::{ErrorBody, Health}};
use models::{Entity, Item, Order, Product, Review, User};
use service::{DynCrud, Services};

use crate::controllers;
use crate::openapi;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> impl IntoResponse {
    encode_metrics()
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::api_doc())
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Route not found")))
}

/// Routes of one collection, meant to be nested at `/api/<plural>`.
pub fn entity_router<E: Entity>(crud: DynCrud<E>) -> Router {
    Router::new()
        .route("/", get(controllers::list::<E>).post(controllers::create::<E>))
        .route("/stats", get(controllers::stats::<E>))
        .route("/search", get(controllers::search::<E>))
        .route("/audit", get(controllers::audit::<E>))
        .route(
            "/bulk",
            post(controllers::bulk_create::<E>)
                .patch(controllers::bulk_update::<E>)
                .delete(controllers::bulk_delete::<E>),
        )
        .route(
            "/:id",
            get(controllers::get_one::<E>)
                .put(controllers::update::<E>)
                .patch(controllers::update::<E>)
                .delete(controllers::remove::<E>),
        )
        .with_state(crud)
}

fn nest_path<E: Entity>() -> String {
    format!("/api/{}", E::PLURAL)
}

/// Build the full application router: the five collections plus health, metrics and docs.
pub fn build_router(services: &Services, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest(&nest_path::<Item>(), entity_router::<Item>(services.items.clone()))
        .nest(&nest_path::<User>(), entity_router::<User>(services.users.clone()))
        .nest(&nest_path::<Product>(), entity_router::<Product>(services.products.clone()))
        .nest(&nest_path::<Order>(), entity_router::<Order>(services.orders.clone()))
        .nest(&nest_path::<Review>(), entity_router::<Review>(services.reviews.clone()))
        .fallback(not_found)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
