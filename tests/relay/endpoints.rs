use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use strawberry::chat::{Conversation, TurnRequest, TurnState};
use strawberry::config::RelayConfig;
use strawberry::llm::PromptEnhancer;
use strawberry::relay::run_relay_with_listener;

use super::chat_harness::{RecordingSink, chat_fixture, config_for};

/// Start a relay whose upstreams live on `upstream`; returns its base URL.
async fn spawn_relay(upstream: &MockServer) -> String {
    let config = RelayConfig {
        groq_url: format!("{}/openai/v1/chat/completions", upstream.uri()),
        groq_api_key: Some("gsk-test".into()),
        blackbox_url: format!("{}/api/chat", upstream.uri()),
        blackbox_session_id: Some("sid".into()),
        blackbox_session_token: Some("tok".into()),
        ..RelayConfig::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = run_relay_with_listener("127.0.0.1", listener, config).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn enhancer_client_round_trips_through_relay() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Describe a sunset over the sea in vivid detail."}}]
        })))
        .mount(&upstream)
        .await;
    let relay = spawn_relay(&upstream).await;

    let enhancer = PromptEnhancer::new(&format!("{relay}/api/enhance-prompt"));
    let enhanced = enhancer
        .enhance("sunset", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(enhanced, "Describe a sunset over the sea in vivid detail.");
}

#[tokio::test]
async fn enhancer_client_surfaces_relay_error() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&upstream)
        .await;
    let relay = spawn_relay(&upstream).await;

    let err = PromptEnhancer::new(&format!("{relay}/api/enhance-prompt"))
        .enhance("sunset", CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to get enhanced prompt from Groq API");
}

#[tokio::test]
async fn samurai_v2_turn_runs_through_relay() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "who are you?"}],
            "codeModelMode": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("I am Samurai."))
        .mount(&upstream)
        .await;
    let relay = spawn_relay(&upstream).await;

    // Only the relay URL matters for this model.
    let mut config = config_for(&upstream);
    config.providers.samurai_v2_url = format!("{relay}/api/samurai-v2");
    let fixture = chat_fixture(&config);
    let sink = RecordingSink::default();
    let mut conversation = Conversation::new();

    let outcome = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("who are you?", "Samurai Ai v2"),
            CancellationToken::new(),
            &sink,
        )
        .await
        .unwrap();

    assert_eq!(outcome.state, TurnState::Done);
    assert_eq!(outcome.content, "I am Samurai.");
    assert_eq!(sink.text(), "I am Samurai.");

    let forwarded = upstream.received_requests().await.unwrap();
    let payload: Value = serde_json::from_slice(&forwarded[0].body).unwrap();
    let id = payload["messages"][0]["id"].as_str().unwrap();
    assert_eq!(id.len(), 7);
}

#[tokio::test]
async fn relay_rejects_wrong_method_and_bad_bodies() {
    let upstream = MockServer::start().await;
    let relay = spawn_relay(&upstream).await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{relay}/api/enhance-prompt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);

    let response = client
        .post(format!("{relay}/api/samurai-v2"))
        .json(&json!({"messages": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Invalid request format. Messages array is required."
    );
}
