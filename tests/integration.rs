//! Integration tests: health, api-key guard, points add/get/remove/list.
//!
//! The REST tests run against an in-memory ledger. The Postgres ledger test
//! needs `TEST_DATABASE_URL` and is skipped otherwise.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use kick_points::error::{AppError, AppResult};
use kick_points::models::{RemovalOutcome, UserRecord};
use kick_points::{create_app, db, AppState, PgPointsLedger, PointsLedger};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

const API_KEY: &str = "test-key";

#[derive(Default)]
struct MemoryLedger {
    balances: Mutex<BTreeMap<String, i32>>,
}

#[async_trait]
impl PointsLedger for MemoryLedger {
    async fn add_points(&self, username: &str, points: i32) -> AppResult<i32> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(username.to_string()).or_insert(0);
        *balance += points;
        Ok(*balance)
    }

    async fn remove_points(&self, username: &str, points: i32) -> AppResult<RemovalOutcome> {
        let mut balances = self.balances.lock().unwrap();
        match balances.get_mut(username) {
            Some(balance) if *balance >= points => {
                *balance -= points;
                Ok(RemovalOutcome::Removed { new_total: *balance })
            }
            _ => Ok(RemovalOutcome::Insufficient),
        }
    }

    async fn get_points(&self, username: &str) -> AppResult<i32> {
        self.balances
            .lock()
            .unwrap()
            .get(username)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("no points recorded for {}", username)))
    }

    async fn all_users(&self) -> AppResult<Vec<UserRecord>> {
        let now = Utc::now();
        Ok(self
            .balances
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, (username, points))| UserRecord {
                id: i as i32 + 1,
                username: username.clone(),
                points: *points,
                updated_at: now,
                created_at: now,
            })
            .collect())
    }
}

fn app() -> axum::Router {
    create_app(AppState::new(API_KEY, Arc::new(MemoryLedger::default())))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_returns_ok_without_key() {
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let res = app().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
}

#[tokio::test]
async fn points_routes_require_api_key() {
    let app = app();

    let req = Request::builder()
        .uri("/points")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "missing key should be 401");

    let req = Request::builder()
        .method("POST")
        .uri("/points/add")
        .header("content-type", "application/json")
        .header("api-key", "wrong")
        .body(Body::from(r#"{"username":"bob","points":5}"#))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "wrong key should be 401");
    let json = json_body(res).await;
    assert!(json.get("error").is_some());

    let res = app.oneshot(get("/points")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK, "valid key should pass");
}

#[tokio::test]
async fn add_get_remove_round() {
    let app = app();

    let res = app
        .clone()
        .oneshot(post("/points/add", serde_json::json!({ "username": "bob", "points": 15 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, serde_json::json!({ "newAmount": 15 }));

    let res = app.clone().oneshot(get("/points/bob")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, serde_json::json!({ "points": 15 }));

    let res = app
        .clone()
        .oneshot(post("/points/remove", serde_json::json!({ "username": "bob", "points": 10 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        json_body(res).await,
        serde_json::json!({ "success": true, "newAmount": 5 })
    );

    let res = app
        .clone()
        .oneshot(post("/points/remove", serde_json::json!({ "username": "bob", "points": 10 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, serde_json::json!({ "success": false }));

    let res = app.oneshot(get("/points")).await.unwrap();
    let json = json_body(res).await;
    let users = json["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "bob");
    assert_eq!(users[0]["points"], 5);
    assert!(users[0].get("updatedAt").is_some());
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let res = app().oneshot(get("/points/nobody")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_bodies_are_client_errors() {
    let app = app();

    let res = app
        .clone()
        .oneshot(post("/points/add", serde_json::json!({ "username": "bob", "points": 0 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "non-positive points");

    let res = app
        .clone()
        .oneshot(post("/points/remove", serde_json::json!({ "username": "", "points": 3 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "empty username");

    let res = app
        .clone()
        .oneshot(post("/points/add", serde_json::json!({ "user": "bob" })))
        .await
        .unwrap();
    assert!(res.status().is_client_error(), "missing fields");
    let json = json_body(res).await;
    assert!(json["error"].is_string(), "rejections use the error body");

    let req = Request::builder()
        .method("POST")
        .uri("/points/remove")
        .header("content-type", "application/json")
        .header("api-key", API_KEY)
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "malformed json");
    let json = json_body(res).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn postgres_ledger_upserts_and_fails_closed() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => {
            eprintln!("Skip integration test: set TEST_DATABASE_URL");
            return;
        }
    };
    let pool = match db::create_pool(&database_url).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Skip integration test: {}", e);
            return;
        }
    };
    db::run_migrations(&pool).await.unwrap();
    let ledger = PgPointsLedger::new(pool);

    let username = format!(
        "it-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis()
    );

    assert_eq!(ledger.add_points(&username, 4).await.unwrap(), 4);
    assert_eq!(ledger.add_points(&username, 6).await.unwrap(), 10);
    assert_eq!(ledger.get_points(&username).await.unwrap(), 10);
    assert_eq!(
        ledger.remove_points(&username, 11).await.unwrap(),
        RemovalOutcome::Insufficient
    );
    assert_eq!(
        ledger.remove_points(&username, 10).await.unwrap(),
        RemovalOutcome::Removed { new_total: 0 }
    );
    assert_eq!(
        ledger.remove_points("it-never-seen", 1).await.unwrap(),
        RemovalOutcome::Insufficient
    );
    assert!(matches!(
        ledger.get_points("it-never-seen").await,
        Err(AppError::NotFound(_))
    ));
    let users = ledger.all_users().await.unwrap();
    assert!(users.iter().any(|u| u.username == username && u.points == 0));
}
