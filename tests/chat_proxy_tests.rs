use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header as http_header},
};
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::util::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request as MockRequest, ResponseTemplate};

use intervue::core::avatar::{
    ChatCompletionSource, FrameBuffer, HttpChatSource, StreamAccumulator, parse_frames,
};
use intervue::core::interview::ChatContext;
use intervue::{ServerConfig, routes, state::AppState};

const COMPLETIONS_PATH: &str = "/openai/deployments/interviewer/chat/completions";

fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let frame = json!({ "choices": [{ "delta": { "content": delta } }] });
        body.push_str(&format!("data: {frame}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn config(upstream: &MockServer) -> ServerConfig {
    ServerConfig {
        azure_openai_endpoint: Some(format!("{}/", upstream.uri())),
        azure_openai_api_key: Some("openai-key".to_string()),
        azure_openai_deployment: Some("interviewer".to_string()),
        ..ServerConfig::default()
    }
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/azure-chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_chat_proxies_stream_unchanged() {
    let upstream = MockServer::start().await;
    let sse = sse_body(&["Hello", "."]);
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(query_param("api-version", "2023-06-01-preview"))
        .and(header("api-key", "openai-key"))
        .and(body_partial_json(json!({
            "stream": true,
            "temperature": 0.7,
            "max_tokens": 150
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse.clone(), "text/event-stream"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = routes::create_app(AppState::new(config(&upstream)).unwrap());
    let response = app
        .oneshot(chat_request(json!({
            "userDetails": { "name": "Sam" },
            "interviewHistory": [],
            "settings": { "interviewer_gender": "female" }
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[http_header::CACHE_CONTROL],
        "no-cache"
    );
    assert!(
        response.headers()[http_header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), sse);
}

#[tokio::test]
async fn test_chat_builds_interviewer_conversation() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&["Ok."]), "text/event-stream"),
        )
        .mount(&upstream)
        .await;

    let app = routes::create_app(AppState::new(config(&upstream)).unwrap());
    let response = app
        .oneshot(chat_request(json!({
            "userDetails": { "name": "Sam" },
            "interviewHistory": [
                { "question": "Why Rust?", "answer": "Safety and speed." }
            ],
            "settings": { "interviewer_gender": "female" },
            "userMessage": "Can you repeat that?"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let received: Vec<MockRequest> = upstream.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
    let messages = sent["messages"].as_array().unwrap();

    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"].as_str().unwrap().contains("Alexandra"));
    assert_eq!(messages[1], json!({ "role": "assistant", "content": "Why Rust?" }));
    assert_eq!(messages[2], json!({ "role": "user", "content": "Safety and speed." }));
    assert_eq!(
        messages.last().unwrap(),
        &json!({ "role": "user", "content": "Can you repeat that?" })
    );
}

#[tokio::test]
async fn test_chat_upstream_error_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&upstream)
        .await;

    let app = routes::create_app(AppState::new(config(&upstream)).unwrap());
    let response = app.oneshot(chat_request(json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Azure OpenAI API error: 429 - rate limited");
}

#[tokio::test]
async fn test_chat_source_reads_sentences_through_server() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&["Tell", " me", " about", " yourself", ".", " Take", " your", " time", "."]),
            "text/event-stream",
        ))
        .mount(&upstream)
        .await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let app = routes::create_app(AppState::new(config(&upstream)).unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let source = HttpChatSource::new(&format!("http://{address}"), Duration::from_secs(5)).unwrap();
    let mut stream = source.open_stream(&ChatContext::default()).await.unwrap();

    let mut frames = FrameBuffer::new();
    let mut accumulator = StreamAccumulator::new();
    let mut sentences = Vec::new();
    while let Some(chunk) = stream.next().await {
        if let Some(block) = frames.push(&chunk.unwrap()) {
            for delta in parse_frames(&block) {
                if let Some(sentence) = accumulator.push(&delta) {
                    sentences.push(sentence);
                }
            }
        }
    }

    assert_eq!(sentences, vec!["Tell me about yourself.", " Take your time."]);
    assert_eq!(accumulator.full_text(), "Tell me about yourself. Take your time.");
    assert!(accumulator.finish().is_none());
}

#[tokio::test]
async fn test_chat_source_reports_server_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let app = routes::create_app(AppState::new(ServerConfig::default()).unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let source = HttpChatSource::new(&format!("http://{address}"), Duration::from_secs(5)).unwrap();
    let err = match source.open_stream(&ChatContext::default()).await {
        Ok(_) => panic!("expected a chat failure"),
        Err(err) => err,
    };

    assert!(err.to_string().contains("Chat API failed: 500"));
}
