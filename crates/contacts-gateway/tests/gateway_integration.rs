use std::net::TcpListener;
use std::sync::Arc;

use contacts_config::AppConfig;
use contacts_db::migrations::source::bundled_dir;
use contacts_db::{Database, MigrationSource};
use contacts_gateway::GatewayServer;
use serde_json::{Value, json};

/// Pick a random available port.
fn random_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind to random port");
    listener.local_addr().unwrap().port()
}

fn test_config(port: u16) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config
}

/// Migrate a fresh in-memory database, start the server in the background
/// and return its base URL.
async fn start_test_gateway() -> String {
    let port = random_port();
    let db = Database::in_memory().expect("open in-memory database");
    db.apply_migrations(&MigrationSource::new(bundled_dir()))
        .expect("bundled migrations apply");

    let server = GatewayServer::new(test_config(port), Arc::new(db));
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Wait for the server to be ready
    for _ in 0..50 {
        if TcpListener::bind(format!("127.0.0.1:{port}")).is_err() {
            break; // port is in use = server is up
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let base = start_test_gateway().await;

    let resp = reqwest::get(format!("{base}/health"))
        .await
        .expect("health request failed");
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn contact_lifecycle_over_http() {
    let base = start_test_gateway().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/contacts"))
        .json(&json!({
            "name": "Ana",
            "email": "ana@example.com",
            "phone": "11999998888",
            "category_id": "friends"
        }))
        .send()
        .await
        .expect("create request failed");
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_str().expect("id is a string").to_string();

    let listed: Value = client
        .get(format!("{base}/contacts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let resp = client
        .put(format!("{base}/contacts/{id}"))
        .json(&json!({"name": "Ana Souza", "email": "ana@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["name"], "Ana Souza");
    assert!(updated["phone"].is_null());

    let resp = client
        .delete(format!("{base}/contacts/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{base}/contacts/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "contact not found");
}

#[tokio::test]
async fn invalid_payload_returns_error_body() {
    let base = start_test_gateway().await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/contacts"))
        .json(&json!({"email": "ana@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "name is required");
}
