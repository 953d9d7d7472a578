//! HTTP transport tests against a local mock server.

use serde_json::json;
use std::time::Duration;
use taskpoll_client::{
    ClientConfig, CompletionRequest, HttpTaskApi, TaskApi, TaskClient, TaskError, TransportError,
};
use taskpoll_core::{ChatMessage, TaskId};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "spsw.test-token";

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(TOKEN)
        .with_base_url(format!("{}/api/v1", server.uri()))
        .with_timeout(Duration::from_secs(5))
}

fn payload() -> taskpoll_client::SubmitPayload {
    CompletionRequest::new("gemini", vec![ChatMessage::user("hello")]).to_payload()
}

#[tokio::test]
async fn test_submit_sends_token_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chatCompletion"))
        .and(header("x-custom-token", TOKEN))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "type": 2,
            "question": "hello",
            "imageUrl": "",
            "generateImage": 0,
            "priority": 50
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "taskId": "42"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpTaskApi::new(&config(&server)).unwrap();
    let body = api.submit(&payload()).await.unwrap();
    assert_eq!(body["taskId"], "42");
}

#[tokio::test]
async fn test_poll_sends_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chatResult"))
        .and(body_json(json!({"id": 42})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "AI任务处理中"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpTaskApi::new(&config(&server)).unwrap();
    let body = api.poll(TaskId(42)).await.unwrap();
    assert_eq!(body["message"], "AI任务处理中");
}

#[tokio::test]
async fn test_status_mapping() {
    let cases = [
        (401, "unauthorized"),
        (403, "forbidden"),
        (400, "bad request"),
        (429, "slow down"),
        (502, "bad gateway"),
        (404, "not found"),
    ];

    for (status, body) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;

        let api = HttpTaskApi::new(&config(&server)).unwrap();
        let err = api.poll(TaskId(1)).await.unwrap_err();

        match status {
            401 | 403 => assert!(matches!(err, TransportError::Authentication { status: s } if s == status)),
            400 => assert!(matches!(err, TransportError::BadRequest(ref b) if b == body)),
            429 => assert!(matches!(err, TransportError::RateLimited)),
            502 => assert!(matches!(err, TransportError::Server { status: 502, .. })),
            _ => assert!(matches!(err, TransportError::Status { status: 404, .. })),
        }
    }
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let api = HttpTaskApi::new(&config(&server)).unwrap();
    let err = api.poll(TaskId(1)).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_client_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chatCompletion"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "ok", "data": 77})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chatResult"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {"status": "completed", "answer": "served over real HTTP"}
        })))
        .mount(&server)
        .await;

    let client = TaskClient::new(config(&server)).unwrap();
    let completion = client
        .create_completion(client.request(vec![ChatMessage::user("hi")]))
        .await
        .unwrap();

    assert_eq!(completion.id, "77");
    assert_eq!(completion.content, "served over real HTTP");
}

#[tokio::test]
async fn test_client_rejected_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = TaskClient::new(config(&server)).unwrap();
    let err = client.generate("", "hi").await.unwrap_err();
    assert!(matches!(err, TaskError::Authentication(_)));
}

#[tokio::test]
async fn test_retrieve_task_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chatResult"))
        .and(body_json(json!({"id": 12})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "message": "AI任务处理失败",
            "answer": "配额不足"
        })))
        .mount(&server)
        .await;

    let client = TaskClient::new(config(&server)).unwrap();
    let record = client.retrieve_task("12").await.unwrap();
    assert_eq!(record.task_id, TaskId(12));
    assert_eq!(record.outcome.status.label(), "rate_limited");
}
