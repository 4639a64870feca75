use std::net::SocketAddr;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use server::startup::build_app;
use service::Services;

struct TestApp {
    base_url: String,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let services = Services::default();
    services.seed_demo_data().await?;
    let app = build_app(&services);

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().build().expect("reqwest client")
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn e2e_seeded_users_round_trip() -> anyhow::Result<()> {
    let app = start_server().await?;
    let http = client();

    let res = http.get(format!("{}/api/users?role=admin", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.headers().get("x-total-count").and_then(|v| v.to_str().ok()), Some("1"));

    let res = http
        .post(format!("{}/api/users", app.base_url))
        .json(&json!({"name": "Dan", "email": "DAN@Example.com"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let created: Value = res.json().await?;
    assert_eq!(created["email"], "dan@example.com");
    assert_eq!(created["id"], 4);

    let res = http
        .post(format!("{}/api/users", app.base_url))
        .json(&json!({"name": "Dan again", "email": "dan@example.com"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    let res = http.delete(format!("{}/api/users/4", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NO_CONTENT);

    let res = http.get(format!("{}/api/orders/stats", app.base_url)).send().await?;
    let stats: Value = res.json().await?;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["revenue"], 548.98);
    Ok(())
}
