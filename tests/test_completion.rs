//! Completion client against a local mock of the completion endpoint.

use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use serde_json::{Value, json};

use gpt_relay_bot::llm::providers::yandexgpt::YandexGptProvider;
use gpt_relay_bot::llm::{Completion, ProviderError};

const PATH: &str = "/foundationModels/v1/completion";

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}{PATH}")
}

fn provider(url: String, timeout_seconds: u64) -> YandexGptProvider {
    YandexGptProvider::new(
        url,
        "yandexgpt-lite".into(),
        "b1gfolder".into(),
        "test-key".into(),
        timeout_seconds,
    )
    .unwrap()
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Reply with a summary of what the request carried so the test can assert on it.
async fn inspect_request(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let summary = format!(
        "{}|{}|{}|{}|{}|{}",
        header(&headers, "authorization"),
        header(&headers, "x-folder-id"),
        body["modelUri"].as_str().unwrap_or_default(),
        body["completionOptions"]["maxTokens"],
        body["messages"][0]["role"].as_str().unwrap_or_default(),
        body["messages"][0]["text"].as_str().unwrap_or_default(),
    );
    Json(json!({
        "result": {
            "alternatives": [{
                "message": { "role": "assistant", "text": summary },
                "status": "ALTERNATIVE_STATUS_FINAL"
            }],
            "usage": { "inputTextTokens": "5", "completionTokens": "7", "totalTokens": "12" },
            "modelVersion": "23.10.2024"
        }
    }))
}

#[tokio::test]
async fn sends_expected_request_and_extracts_reply() {
    let url = spawn_server(Router::new().route(PATH, post(inspect_request))).await;
    let completion = provider(url, 5).complete("what is \"rust\"?\nbriefly").await.unwrap();
    assert_eq!(
        completion,
        Completion::Reply(
            "Api-Key test-key|b1gfolder|gpt://b1gfolder/yandexgpt-lite|100|user|what is \"rust\"?\nbriefly"
                .into()
        )
    );
}

#[tokio::test]
async fn empty_object_body_is_not_an_error() {
    let url = spawn_server(Router::new().route(PATH, post(|| async { Json(json!({})) }))).await;
    let completion = provider(url, 5).complete("hi").await.unwrap();
    assert_eq!(completion, Completion::UnexpectedShape);
}

#[tokio::test]
async fn empty_alternatives_is_not_an_error() {
    let router = Router::new().route(
        PATH,
        post(|| async { Json(json!({ "result": { "alternatives": [] } })) }),
    );
    let url = spawn_server(router).await;
    let completion = provider(url, 5).complete("hi").await.unwrap();
    assert_eq!(completion, Completion::NoAlternatives);
}

#[tokio::test]
async fn http_error_envelope_becomes_status_error() {
    let router = Router::new().route(
        PATH,
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": {
                        "grpcCode": 16,
                        "httpCode": 401,
                        "message": "Unknown api key",
                        "httpStatus": "Unauthorized"
                    }
                })),
            )
        }),
    );
    let url = spawn_server(router).await;
    let err = provider(url, 5).complete("hi").await.unwrap_err();
    match err {
        ProviderError::Status(msg) => {
            assert!(msg.contains("401"), "{msg}");
            assert!(msg.contains("Unknown api key"), "{msg}");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = provider(format!("http://127.0.0.1:{port}{PATH}"), 5)
        .complete("hi")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn slow_service_hits_timeout() {
    let router = Router::new().route(
        PATH,
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let url = spawn_server(router).await;
    let err = provider(url, 1).complete("hi").await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "{err:?}");
}
