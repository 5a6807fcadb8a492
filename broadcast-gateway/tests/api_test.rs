//! Integration tests for the gateway HTTP API.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use broadcast_gateway::test_util::{MockRadio, SentText};
use broadcast_gateway::{AppState, Config, RadioLink};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(radio: RadioLink) -> Router {
    broadcast_gateway::app(Arc::new(AppState::new(Config::default(), radio)))
}

fn connected(radio: &Arc<MockRadio>) -> Router {
    app_with(RadioLink::Connected(radio.clone()))
}

fn disconnected() -> Router {
    app_with(RadioLink::Unavailable {
        reason: "No such file or directory".to_string(),
    })
}

async fn post_broadcast(app: Router, body: Value) -> (StatusCode, Value) {
    post_raw(app, Some("application/json"), body.to_string()).await
}

async fn post_raw(app: Router, content_type: Option<&str>, body: String) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri("/broadcast");
    if let Some(content_type) = content_type {
        builder = builder.header("Content-Type", content_type);
    }

    let response = app
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get_health(app: Router) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_broadcast_defaults_to_all_nodes() {
    let radio = Arc::new(MockRadio::new());
    let (status, body) = post_broadcast(connected(&radio), json!({"message": "Hello"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "message": "Message broadcasted successfully",
            "text": "Hello",
            "destinationId": "^all"
        })
    );
    assert_eq!(
        radio.sent(),
        vec![SentText {
            text: "Hello".to_string(),
            destination: "^all".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_broadcast_to_specific_node() {
    let radio = Arc::new(MockRadio::new());
    let (status, body) = post_broadcast(
        connected(&radio),
        json!({"message": "Hello", "destinationId": "!abcd1234"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destinationId"], "!abcd1234");
    assert_eq!(body["text"], "Hello");
    assert_eq!(radio.sent().len(), 1);
    assert_eq!(radio.sent()[0].destination, "!abcd1234");
}

#[tokio::test]
async fn test_broadcast_sends_message_untrimmed() {
    let radio = Arc::new(MockRadio::new());
    let (status, body) =
        post_broadcast(connected(&radio), json!({"message": "  spaced out  "})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "  spaced out  ");
    assert_eq!(radio.sent()[0].text, "  spaced out  ");
}

#[tokio::test]
async fn test_broadcast_null_destination_uses_broadcast() {
    let radio = Arc::new(MockRadio::new());
    let (status, body) = post_broadcast(
        connected(&radio),
        json!({"message": "Hello", "destinationId": null}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destinationId"], "^all");
}

#[tokio::test]
async fn test_broadcast_rejects_blank_message() {
    for message in ["", "   ", "\n\t"] {
        let radio = Arc::new(MockRadio::new());
        let (status, body) = post_broadcast(connected(&radio), json!({"message": message})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "message {:?}", message);
        assert_eq!(body["detail"], "Message cannot be empty");
        assert!(radio.sent().is_empty());
    }
}

#[tokio::test]
async fn test_broadcast_without_radio_is_unavailable() {
    let (status, body) = post_broadcast(disconnected(), json!({"message": "Hello"})).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["detail"],
        "Meshtastic interface not available. Check device connection."
    );
    assert_eq!(body["error_type"], "device_unavailable");
}

#[tokio::test]
async fn test_missing_radio_is_checked_before_message() {
    let (status, _) = post_broadcast(disconnected(), json!({"message": "   "})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_broadcast_device_failure() {
    let radio = Arc::new(MockRadio::failing_send("write timed out"));
    let (status, body) = post_broadcast(connected(&radio), json!({"message": "Hello"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "device_failure");
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Failed to broadcast message:"));
    assert!(detail.contains("write timed out"));
}

#[tokio::test]
async fn test_broadcast_after_close_fails() {
    use broadcast_gateway::MeshRadio;

    let radio = Arc::new(MockRadio::new());
    radio.close().await.unwrap();
    let (status, body) = post_broadcast(connected(&radio), json!({"message": "Hello"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("closed"));
}

#[tokio::test]
async fn test_broadcast_requires_message_field() {
    let radio = Arc::new(MockRadio::new());
    let (status, body) = post_broadcast(connected(&radio), json!({"destinationId": "^all"})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "invalid_body");
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Invalid request body:"), "{}", detail);
    assert!(detail.contains("message"), "{}", detail);
    assert!(radio.sent().is_empty());
}

#[tokio::test]
async fn test_broadcast_rejects_malformed_json() {
    let radio = Arc::new(MockRadio::new());
    let (status, body) = post_raw(
        connected(&radio),
        Some("application/json"),
        "{not json".to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "invalid_body");
    assert!(body["detail"].as_str().unwrap().starts_with("Invalid request body:"));
    assert!(radio.sent().is_empty());
}

#[tokio::test]
async fn test_broadcast_rejects_missing_content_type() {
    let radio = Arc::new(MockRadio::new());
    let (status, body) = post_raw(
        connected(&radio),
        None,
        json!({"message": "Hello"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "invalid_body");
    assert!(radio.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_rejected_even_without_radio() {
    let (status, body) = post_raw(
        disconnected(),
        Some("application/json"),
        "[]".to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "invalid_body");
}

#[tokio::test]
async fn test_health_reports_connected() {
    let radio = Arc::new(MockRadio::new());
    let (status, body) = get_health(connected(&radio)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "meshtastic_connected": true}));
}

#[tokio::test]
async fn test_health_reports_disconnected() {
    let (status, body) = get_health(disconnected()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "meshtastic_connected": false}));
}

#[tokio::test]
async fn test_health_reports_handle_without_touching_link() {
    use broadcast_gateway::MeshRadio;

    // A closed radio still counts as a present handle.
    let radio = Arc::new(MockRadio::new());
    radio.close().await.unwrap();
    let (_, body) = get_health(connected(&radio)).await;

    assert_eq!(body["meshtastic_connected"], true);
}

#[tokio::test]
async fn test_concurrent_broadcasts_each_send_once() {
    let radio = Arc::new(MockRadio::new());
    let app = connected(&radio);

    let mut handles = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            post_broadcast(app, json!({"message": format!("msg {}", i)})).await
        }));
    }
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let mut texts: Vec<String> = radio.sent().into_iter().map(|s| s.text).collect();
    texts.sort();
    let mut expected: Vec<String> = (0..8).map(|i| format!("msg {}", i)).collect();
    expected.sort();
    assert_eq!(texts, expected);
}
