use barista_api::{
    AppConfig, AppState, InMemoryDrinkStore, create_router,
    config::Env,
    repository::RepositoryState,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use serde_json::{Value, json};
use std::{sync::Arc, time::SystemTime};
use tokio::net::TcpListener;

// --- Test Harness ---

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

/// Spawns the full router (all middleware layers included) on an ephemeral
/// port, backed by the in-memory drink store so no database is needed.
async fn spawn_app() -> TestApp {
    let mut config = AppConfig::default();
    // Production env: token validation only, no local bypass.
    config.env = Env::Production;

    let repo = Arc::new(InMemoryDrinkStore::new()) as RepositoryState;
    let state = AppState { repo, config };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

#[derive(Serialize)]
struct IssuedClaims {
    sub: String,
    exp: usize,
    aud: String,
    permissions: Vec<String>,
}

/// Mints a token the way the external issuer would, signed with the secret
/// and audience that `AppConfig::default()` configures.
fn token_for(permissions: &[&str]) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let defaults = AppConfig::default();
    let claims = IssuedClaims {
        sub: "auth0|tester".to_string(),
        exp: now + 3600,
        aud: defaults.jwt_audience,
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    };

    let key = EncodingKey::from_secret(defaults.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn latte_payload() -> Value {
    json!({
        "title": "Latte",
        "recipe": [{"color": "white", "name": "milk", "parts": 3}]
    })
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_public_menu_needs_no_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/drinks", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["drinks"], json!([]));
}

#[tokio::test]
async fn test_gated_routes_reject_anonymous_requests() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let checks = [
        client.get(format!("{}/drinks-detail", app.address)),
        client
            .post(format!("{}/drinks", app.address))
            .json(&latte_payload()),
        client
            .patch(format!("{}/drinks/1", app.address))
            .json(&json!({"title": "New"})),
        client.delete(format!("{}/drinks/1", app.address)),
    ];

    for request in checks {
        let response = request.send().await.unwrap();
        assert_eq!(response.status(), 401);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 401);
    }
}

#[tokio::test]
async fn test_gated_routes_reject_tokens_without_the_permission() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    // Valid token, but no permissions granted at all.
    let token = token_for(&[]);

    let checks = [
        client.get(format!("{}/drinks-detail", app.address)),
        client
            .post(format!("{}/drinks", app.address))
            .json(&latte_payload()),
        client
            .patch(format!("{}/drinks/1", app.address))
            .json(&json!({"title": "New"})),
        client.delete(format!("{}/drinks/1", app.address)),
    ];

    for request in checks {
        let response = request.bearer_auth(&token).send().await.unwrap();
        assert_eq!(response.status(), 403);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "permission not found");
    }
}

#[tokio::test]
async fn test_create_then_list_round_trip() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Create under post:drinks.
    let response = client
        .post(format!("{}/drinks", app.address))
        .bearer_auth(token_for(&["post:drinks"]))
        .json(&latte_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let created = &body["drinks"][0];
    let id = created["id"].as_i64().expect("assigned integer id");
    assert_eq!(created["title"], "Latte");
    assert_eq!(created["recipe"][0]["name"], "milk");

    // The public menu carries the short view: color and parts, never names.
    let response = client
        .get(format!("{}/drinks", app.address))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["drinks"],
        json!([{"id": id, "title": "Latte", "recipe": [{"color": "white", "parts": 3}]}])
    );

    // The detail view yields the exact recipe back.
    let response = client
        .get(format!("{}/drinks-detail", app.address))
        .bearer_auth(token_for(&["get:drinks-detail"]))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["drinks"][0]["recipe"],
        json!([{"color": "white", "name": "milk", "parts": 3}])
    );
}

#[tokio::test]
async fn test_duplicate_title_never_inserts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token_for(&["post:drinks"]);

    let response = client
        .post(format!("{}/drinks", app.address))
        .bearer_auth(&token)
        .json(&latte_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Same title again: rejected, and the row count must not grow.
    let response = client
        .post(format!("{}/drinks", app.address))
        .bearer_auth(&token)
        .json(&latte_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let response = client
        .get(format!("{}/drinks", app.address))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["drinks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_patch_missing_id_mutates_nothing() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .patch(format!("{}/drinks/999", app.address))
        .bearer_auth(token_for(&["post:drinks"]))
        .json(&json!({"title": "Ghost"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let response = client
        .get(format!("{}/drinks", app.address))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["drinks"], json!([]));
}

#[tokio::test]
async fn test_patch_updates_title_and_keeps_recipe() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/drinks", app.address))
        .bearer_auth(token_for(&["post:drinks"]))
        .json(&latte_payload())
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let id = body["drinks"][0]["id"].as_i64().unwrap();

    let response = client
        .patch(format!("{}/drinks/{}", app.address, id))
        .bearer_auth(token_for(&["post:drinks"]))
        .json(&json!({"title": "Flat White"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["drinks"][0]["title"], "Flat White");
    // Recipe was omitted from the request, so it is left unchanged.
    assert_eq!(body["drinks"][0]["recipe"][0]["name"], "milk");
}

#[tokio::test]
async fn test_delete_removes_exactly_once() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/drinks", app.address))
        .bearer_auth(token_for(&["post:drinks"]))
        .json(&latte_payload())
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let id = body["drinks"][0]["id"].as_i64().unwrap();

    let token = token_for(&["delete:drinks"]);
    let response = client
        .delete(format!("{}/drinks/{}", app.address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "delete": id}));

    // A second delete of the same id reports non-existence.
    let response = client
        .delete(format!("{}/drinks/{}", app.address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_create_rejects_unparseable_body_with_json_envelope() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Not JSON at all. The rejection must still be the fixed envelope, not
    // a plain-text body.
    let response = client
        .post(format!("{}/drinks", app.address))
        .bearer_auth(token_for(&["post:drinks"]))
        .header("content-type", "application/json")
        .body("{ this is not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], 422);
    assert_eq!(body["message"], "unprocessable");

    // Valid JSON but the wrong shape for the payload type.
    let response = client
        .patch(format!("{}/drinks/1", app.address))
        .bearer_auth(token_for(&["post:drinks"]))
        .header("content-type", "application/json")
        .body(r#"{"title": 7}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], 422);
}

#[tokio::test]
async fn test_create_rejects_invalid_payload_with_422() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/drinks", app.address))
        .bearer_auth(token_for(&["post:drinks"]))
        .json(&json!({"title": "", "recipe": [{"color": "white", "name": "milk", "parts": 3}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "unprocessable");
}
