mod common;

use axum::http::{header, StatusCode};
use browzai_llm::Message as LLMMessage;
use common::*;
use tower::ServiceExt;

#[tokio::test]
async fn test_stream_relays_chunks_in_order() {
    let app = test_app(Script::Reply(vec!["Hi", " there", "!"]));

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/chat/stream",
            Some(ALICE_TOKEN),
            r#"{"message":"Hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
    assert_eq!(body_string(response).await, "Hi there!");
}

#[tokio::test]
async fn test_stream_builds_directive_and_uses_configured_model() {
    let app = test_app(Script::Reply(vec!["ok"]));

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/chat/stream",
            Some(ALICE_TOKEN),
            r#"{"message":"Hello","instructions":"Reply in French."}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = app.llm.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "gpt-4o");
    assert_eq!(request.options.temperature, Some(0.7));
    assert_eq!(request.messages.len(), 2);

    match &request.messages[0] {
        LLMMessage::System { content } => assert!(content.ends_with(
            "Here are user instructions keep them in mind: Reply in French."
        )),
        other => panic!("expected system directive, got {:?}", other),
    }
    assert_eq!(request.messages[1], LLMMessage::human("Hello"));
}

#[tokio::test]
async fn test_stream_rejects_invalid_bodies_without_model_call() {
    let app = test_app(Script::Reply(vec!["unused"]));

    for body in [
        "not json",
        r#"{}"#,
        r#"{"message":""}"#,
        r#"{"message":123}"#,
    ] {
        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/api/chat/stream", Some(ALICE_TOKEN), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(body_string(response).await, "Invalid request body");
    }

    assert!(app.llm.requests().is_empty());
}

#[tokio::test]
async fn test_stream_requires_session() {
    let app = test_app(Script::Reply(vec!["unused"]));

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/chat/stream",
            None,
            r#"{"message":"Hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.llm.requests().is_empty());
}

#[tokio::test]
async fn test_stream_setup_failure_is_internal_error() {
    let app = test_app(Script::FailSetup);

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/chat/stream",
            Some(ALICE_TOKEN),
            r#"{"message":"Hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Internal Server Error");
}

#[tokio::test]
async fn test_mid_stream_failure_aborts_body() {
    let app = test_app(Script::FailAfter(vec!["partial", " reply"]));

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/chat/stream",
            Some(ALICE_TOKEN),
            r#"{"message":"Hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let read = axum::body::to_bytes(response.into_body(), usize::MAX).await;
    assert!(read.is_err(), "an aborted stream must not read as a clean end");
}

#[tokio::test]
async fn test_stream_does_not_touch_the_store() {
    let app = test_app(Script::Reply(vec!["a", "b"]));

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/chat/stream",
            Some(ALICE_TOKEN),
            r#"{"message":"Hello"}"#,
        ))
        .await
        .unwrap();
    let _ = body_string(response).await;

    assert_eq!(app.store.message_count().await, 0);
}
