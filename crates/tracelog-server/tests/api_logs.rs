use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tracelog_server::config::{Config, StorageBackend};
use tracelog_server::{app, build_service, AppState};

const CONTROLLER: &str = "controller";
const SERVICE: &str = "billing";

async fn setup() -> Router {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Memory;
    config.tracing.controller = CONTROLLER.to_string();
    config.tracing.integrity_key = "test-key".to_string();
    let app = app(AppState::new(build_service(&config).unwrap()));

    let (status, _) = send(
        &app,
        CONTROLLER,
        "POST",
        "/api/services",
        Some(json!({ "serviceId": SERVICE })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    app
}

async fn send(
    app: &Router,
    caller: &str,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Tracelog-Caller", caller);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn add_log(app: &Router, action: &str, data_id: &str, user_id: &str) -> (StatusCode, Value) {
    send(
        app,
        SERVICE,
        "POST",
        "/api/logs",
        Some(json!({
            "action": action,
            "dataId": data_id,
            "dataName": format!("Document {data_id}"),
            "userId": user_id,
        })),
    )
    .await
}

fn ids(logs: &Value) -> Vec<String> {
    logs.as_array()
        .unwrap()
        .iter()
        .map(|e| {
            let field = |name: &str| e[name].as_str().unwrap().to_string();
            format!("{}/{}/{}", field("userId"), field("dataId"), field("action"))
        })
        .collect()
}

#[tokio::test]
async fn add_log_normalizes_action_and_returns_entry() {
    let app = setup().await;

    let (status, entry) = add_log(&app, "READ", "doc-1", "alice").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["action"], "read");
    assert_eq!(entry["serviceId"], SERVICE);
    assert_eq!(entry["dataName"], "Document doc-1");
    assert_eq!(entry["compositeHash"].as_str().unwrap().len(), 64);
    assert!(entry["id"].is_string());
}

#[tokio::test]
async fn unsupported_action_is_bad_request() {
    let app = setup().await;

    let (status, body) = add_log(&app, "fly", "doc-1", "alice").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"]["InvalidPayload"].as_str().unwrap();
    assert!(message.starts_with("'fly' is not supported."));

    let (_, logs) = send(&app, SERVICE, "GET", "/api/logs", None).await;
    assert!(logs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn queries_filter_entries() {
    let app = setup().await;
    add_log(&app, "read", "doc-1", "alice").await;
    add_log(&app, "write", "doc-1", "bob").await;
    add_log(&app, "read", "doc-2", "alice").await;

    let (status, all) = send(&app, SERVICE, "GET", "/api/logs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, by_action) = send(&app, SERVICE, "GET", "/api/logs/action/READ", None).await;
    assert_eq!(ids(&by_action), ["alice/doc-1/read", "alice/doc-2/read"]);

    let (_, by_user) = send(&app, SERVICE, "GET", "/api/logs/user/bob", None).await;
    assert_eq!(ids(&by_user), ["bob/doc-1/write"]);

    let (_, by_data) = send(&app, SERVICE, "GET", "/api/logs/data/doc-1", None).await;
    assert_eq!(ids(&by_data), ["alice/doc-1/read", "bob/doc-1/write"]);

    let (_, by_user_data) =
        send(&app, SERVICE, "GET", "/api/logs/user/alice/data/doc-2", None).await;
    assert_eq!(ids(&by_user_data), ["alice/doc-2/read"]);

    let (_, by_data_action) =
        send(&app, SERVICE, "GET", "/api/logs/data/doc-1/action/write", None).await;
    assert_eq!(ids(&by_data_action), ["bob/doc-1/write"]);

    let (status, _) = send(&app, SERVICE, "GET", "/api/logs/action/fly", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_round_trip_and_not_found() {
    let app = setup().await;
    add_log(&app, "share", "doc-9", "carol").await;

    let (status, body) = send(
        &app,
        SERVICE,
        "POST",
        "/api/logs/verify",
        Some(json!({ "userId": "carol", "dataId": "doc-9", "action": "SHARE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let (status, body) = send(
        &app,
        SERVICE,
        "POST",
        "/api/logs/verify",
        Some(json!({ "userId": "carol", "dataId": "doc-9", "action": "delete" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]["NotFound"].is_string());
}

#[tokio::test]
async fn generate_id_returns_fresh_ids() {
    let app = setup().await;

    let (status, first) = send(&app, SERVICE, "GET", "/api/ids", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, SERVICE, "GET", "/api/ids", None).await;
    assert_ne!(first["id"], second["id"]);

    let (status, _) = send(&app, "stranger", "GET", "/api/ids", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn controller_cannot_write_logs_without_registration() {
    let app = setup().await;

    let (status, _) = send(
        &app,
        CONTROLLER,
        "POST",
        "/api/logs",
        Some(json!({
            "action": "read",
            "dataId": "doc-1",
            "dataName": "Doc",
            "userId": "alice",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bodies_are_invalid_payload() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        SERVICE,
        "POST",
        "/api/logs",
        Some(json!({ "action": "read" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"]["InvalidPayload"].as_str().unwrap();
    assert!(message.contains("dataId"));

    let (status, body) = send(
        &app,
        SERVICE,
        "POST",
        "/api/logs/verify",
        Some(json!({ "userId": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["InvalidPayload"].is_string());

    let (_, logs) = send(&app, SERVICE, "GET", "/api/logs", None).await;
    assert!(logs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn non_json_registration_body_is_invalid_payload() {
    let app = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/services")
        .header("X-Tracelog-Caller", CONTROLLER)
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"]["InvalidPayload"].is_string());
}
