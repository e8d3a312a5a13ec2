use std::sync::Arc;

use application::{
    Broadcaster, ChatService, ChatServiceDependencies, ConnectionRegistry, InMemoryMessageStore,
    StreamService, SystemClock,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use web_api::{router, AppState, WebSettings};

fn build_router(settings: WebSettings) -> Router {
    let registry = Arc::new(ConnectionRegistry::new());
    let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
        store: Arc::new(InMemoryMessageStore::new(3)),
        archive: None,
        broadcaster: Arc::new(Broadcaster::new(registry.clone())),
        clock: Arc::new(SystemClock),
    }));
    let stream_service = Arc::new(StreamService::new(registry, 8));
    router(AppState::new(chat_service, stream_service, settings))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn post_message(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/messages")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn non_object_body_is_malformed() {
    for body in ["[]", "\"hello\"", "null", "42"] {
        let response = build_router(WebSettings::default())
            .oneshot(post_message(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
        let json = json_body(response).await;
        assert_eq!(json["error"], json!("Bad Request"));
    }
}

#[tokio::test]
async fn empty_body_is_malformed() {
    let response = build_router(WebSettings::default())
        .oneshot(post_message(""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_limit_is_capped_by_store_capacity() {
    let app = build_router(WebSettings::default());
    for n in 0..5 {
        let response = app
            .clone()
            .oneshot(post_message(&format!(
                r#"{{"username":"alice","message":"m{n}"}}"#
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/messages?limit=50")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["count"], json!(3));
    assert_eq!(json["data"][0]["message"], json!("m2"));
    assert_eq!(json["data"][2]["message"], json!("m4"));
}

#[tokio::test]
async fn unparsable_history_limit_uses_error_body() {
    let response = build_router(WebSettings::default())
        .oneshot(
            Request::builder()
                .uri("/api/messages?limit=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], json!("Bad Request"));
    assert_eq!(json["message"], json!("Invalid query parameters"));
    assert!(json["details"][0].as_str().is_some());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = build_router(WebSettings::default())
        .oneshot(
            Request::builder()
                .uri("/api/rooms")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wildcard_cors_allows_any_origin() {
    let response = build_router(WebSettings::default())
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/messages")
                .header(header::ORIGIN, "https://chat.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn restricted_cors_only_echoes_listed_origins() {
    let settings = WebSettings {
        cors_origins: vec!["https://chat.example.com".to_string()],
        ..WebSettings::default()
    };
    let app = build_router(settings);

    let allowed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://chat.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://chat.example.com"
    );

    let denied = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(denied
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
