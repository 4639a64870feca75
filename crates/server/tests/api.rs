use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use server::startup::build_app;
use service::{ServiceSettings, Services};

fn app() -> Router {
    build_app(&Services::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let total = res
        .headers()
        .get("x-total-count")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, total, json)
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = app();
    let (status, _, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, _, body) = send(&app, Method::GET, "/api/widgets", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Route not found"}));
}

#[tokio::test]
async fn item_crud_lifecycle() {
    let app = app();
    let (status, _, created) = send(&app, Method::POST, "/api/items", Some(json!({"name": "Widget", "price": 2.5}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["status"], "active");
    assert!(created["createdAt"].is_string());

    let (status, _, body) = send(&app, Method::POST, "/api/items", Some(json!({"name": "Widget"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let (status, _, body) = send(&app, Method::PATCH, "/api/items/1", Some(json!({"quantity": 7}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 7);
    assert_eq!(body["price"], 2.5);

    let (status, _, body) = send(&app, Method::PUT, "/api/items/1", Some(json!({"status": "bogus"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status. Must be one of: active, inactive, archived");

    let (status, _, body) = send(&app, Method::GET, "/api/items/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");

    let (status, _, body) = send(&app, Method::DELETE, "/api/items/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _, body) = send(&app, Method::DELETE, "/api/items/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Item with id 999 not found");
}

#[tokio::test]
async fn bad_ids_and_bodies_are_rejected() {
    let app = app();
    for uri in ["/api/users/abc", "/api/users/0", "/api/users/-3"] {
        let (status, _, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Invalid id: must be a positive integer");
    }

    let (status, _, body) = send(&app, Method::POST, "/api/users", Some(json!({"name": "Ann"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: email");

    let (status, _, body) = send(&app, Method::POST, "/api/users", Some(json!(["not", "an", "object"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request body must be a JSON object");

    let req = Request::post("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_sorts_and_counts() {
    let app = app();
    for (name, category, price, stock) in [
        ("Mouse", "electronics", 25.0, 100),
        ("Desk", "furniture", 300.0, 4),
        ("Cable", "electronics", 5.0, 0),
    ] {
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(json!({"name": name, "category": category, "price": price, "stock": stock})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, total, body) = send(&app, Method::GET, "/api/products?category=Electronics&sort=price&order=desc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(total.as_deref(), Some("2"));
    let names: Vec<_> = body.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Mouse", "Cable"]);

    let (_, total, body) = send(&app, Method::GET, "/api/products?page=2&limit=2", None).await;
    assert_eq!(total.as_deref(), Some("3"));
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _, _) = send(&app, Method::GET, "/api/products?sort=colour", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, _, stats) = send(&app, Method::GET, "/api/products/stats", None).await;
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["lowStock"], 1);
    assert_eq!(stats["outOfStock"], 1);
}

#[tokio::test]
async fn search_requires_q_but_allows_blank() {
    let app = app();
    send(&app, Method::POST, "/api/reviews", Some(json!({"productId": 1, "author": "Ann", "rating": 5, "title": "Great lamp"}))).await;

    let (status, _, body) = send(&app, Method::GET, "/api/reviews/search?q=LAMP", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _, body) = send(&app, Method::GET, "/api/reviews/search?q=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _, _) = send(&app, Method::GET, "/api/reviews/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_endpoints_partition_or_roll_back() {
    let app = build_app(&Services::new(ServiceSettings { max_bulk: 3, audit_capacity: 10 }));
    let orders = |names: &[&str]| -> Value {
        let list: Vec<Value> = names
            .iter()
            .map(|n| json!({"customerName": n, "customerEmail": "a@b.co", "productName": "Lamp", "quantity": 1, "unitPrice": 10}))
            .collect();
        json!({ "orders": list })
    };

    let (status, _, body) = send(&app, Method::POST, "/api/orders/bulk", Some(orders(&["a", "b", "c", "d"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot create more than 3 orders at once");

    let (status, _, body) = send(&app, Method::POST, "/api/orders/bulk", Some(json!({"orders": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No orders provided");

    let (status, _, body) = send(&app, Method::POST, "/api/orders/bulk", Some(orders(&["a", "b"]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"].as_array().unwrap().len(), 2);

    let bad = json!({"updates": [
        {"id": 1, "changes": {"status": "shipped"}},
        {"id": 2, "changes": {"quantity": 0}}
    ]});
    let (status, _, body) = send(&app, Method::PATCH, "/api/orders/bulk?atomic=true", Some(bad.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Error at index 1: quantity must be a positive integer");
    let (_, _, first) = send(&app, Method::GET, "/api/orders/1", None).await;
    assert_eq!(first["status"], "pending");

    let (status, _, body) = send(&app, Method::PATCH, "/api/orders/bulk", Some(bad)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"][0]["status"], "shipped");
    assert_eq!(body["failed"][0]["index"], 1);

    let (status, _, body) = send(&app, Method::DELETE, "/api/orders/bulk", Some(json!({"ids": [2, 77]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], json!([{"id": 2}]));
    assert_eq!(body["failed"][0]["status"], 404);

    let (_, _, audit) = send(&app, Method::GET, "/api/orders/audit?limit=2", None).await;
    let actions: Vec<_> = audit.as_array().unwrap().iter().map(|e| e["action"].as_str().unwrap()).collect();
    assert_eq!(actions, vec!["delete", "update"]);
}

#[tokio::test]
async fn metrics_and_openapi_are_served() {
    let app = app();
    send(&app, Method::GET, "/api/items", None).await;

    let res = app.clone().oneshot(Request::get("/metrics").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("inventory_entity_operations_total"));

    let (status, _, doc) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/reviews/{id}"].is_object());
}

#[tokio::test]
async fn malformed_bulk_elements_fail_only_their_index() {
    let app = app();
    let (status, _, body) = send(&app, Method::POST, "/api/items/bulk", Some(json!({"items": [{"name": "ok"}, 42]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"].as_array().unwrap().len(), 1);
    assert_eq!(body["failed"][0]["index"], 1);
    assert_eq!(body["failed"][0]["status"], 400);
    assert!(body["failed"][0]["error"].as_str().unwrap().starts_with("Invalid element: "));
    let (_, total, _) = send(&app, Method::GET, "/api/items", None).await;
    assert_eq!(total.as_deref(), Some("1"));

    let updates = json!({"updates": [{"id": 1, "changes": {"quantity": 4}}, {"changes": {}}]});
    let (status, _, body) = send(&app, Method::PATCH, "/api/items/bulk", Some(updates.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"][0]["quantity"], 4);
    assert_eq!(body["failed"][0]["index"], 1);
    assert!(body["failed"][0]["error"].as_str().unwrap().contains("missing field `id`"));

    // atomic 模式仍在第一个坏元素处整体失败
    let (status, _, body) = send(&app, Method::POST, "/api/items/bulk?atomic=true", Some(json!({"items": [{"name": "x"}, 42]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Error at index 1: Invalid element: "));
    let (_, total, _) = send(&app, Method::GET, "/api/items", None).await;
    assert_eq!(total.as_deref(), Some("1"));
}

#[tokio::test]
async fn undecodable_path_ids_are_json_errors() {
    let app = app();
    for method in [Method::GET, Method::PATCH, Method::DELETE] {
        let body = (method == Method::PATCH).then(|| json!({"quantity": 1}));
        let (status, _, body) = send(&app, method, "/api/items/%FF", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid id: must be a positive integer"}));
    }
}
