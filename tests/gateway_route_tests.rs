use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use tower::ServiceExt;

async fn test_router() -> (axum::Router, &'static str) {
    let key = "test-secret-key";
    let mut config = pollux::config::GatewayConfig::default();
    config.auth_password = key.to_string();
    config.credentials_path = std::env::temp_dir().join(format!(
        "pollux-gateway-route-tests-{}-{}.json",
        std::process::id(),
        uuid::Uuid::new_v4()
    ));

    let state = pollux::server::GatewayState::new(config).await;
    (pollux::server::gateway_router(state), key)
}

#[tokio::test]
async fn root_and_health_require_no_key() {
    let (app, _key) = test_router().await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_completions_without_key_is_unauthorized() {
    let (app, _key) = test_router().await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"model":"gemini-2.5-pro","messages":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("www-authenticate"));
}

#[tokio::test]
async fn chat_completions_with_key_but_no_credential_is_server_error() {
    let (app, key) = test_router().await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/chat/completions")
                .header("content-type", "application/json")
                .header("x-goog-api-key", key)
                .body(Body::from(
                    r#"{"model":"gemini-2.5-pro","messages":[{"role":"user","content":"hi"}]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"]["type"], "api_error");
}

#[tokio::test]
async fn models_route_requires_key_and_lists_catalog() {
    let (app, key) = test_router().await;

    let unauthed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/models")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unauthed.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/v1/models")
                .header("x-goog-api-key", key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["object"], "list");
    assert!(body["data"].as_array().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn unknown_route_falls_back_to_404() {
    let (app, key) = test_router().await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/not-a-real-route")
                .header("x-goog-api-key", key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
