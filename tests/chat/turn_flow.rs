use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use strawberry::chat::{Conversation, TurnNotice, TurnRequest, TurnState};
use strawberry::error::ChatError;
use strawberry::llm::{DoneReason, ProviderKind, StreamEvent};
use strawberry::session::{Role, SessionStore};

use super::chat_harness::{
    CHAT_PATH, RELAY_PATH, RecordingSink, chat_fixture, config_for, sse_body,
};

const SAMURAI_MODEL: &str = "openai/gpt-4.1-mini";

#[tokio::test]
async fn streamed_answer_is_shown_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer sk-samurai"))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&["4"]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fixture = chat_fixture(&config_for(&server));
    let sink = RecordingSink::default();
    let mut conversation = Conversation::new();

    let outcome = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("2+2?", SAMURAI_MODEL),
            CancellationToken::new(),
            &sink,
        )
        .await
        .expect("turn should run");

    assert_eq!(outcome.state, TurnState::Done);
    assert_eq!(outcome.content, "4");
    assert_eq!(outcome.notice, None);
    assert_eq!(
        sink.events(),
        vec![
            StreamEvent::TextDelta { text: "4".into() },
            StreamEvent::Done {
                reason: DoneReason::Sentinel
            },
        ]
    );

    let requests = server.received_requests().await.expect("requests recorded");
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], SAMURAI_MODEL);
    assert_eq!(body["stream"], true);
    assert_eq!(body["messages"], json!([{"role": "user", "content": "2+2?"}]));

    let stored = fixture
        .store
        .get_session(&outcome.session_id)
        .await
        .unwrap()
        .expect("session stored");
    assert_eq!(stored.title, "2+2?");
    assert_eq!(stored.messages.len(), 2);
    assert_eq!(stored.messages[0].role, Role::User);
    assert_eq!(stored.messages[0].content, "2+2?");
    assert_eq!(stored.messages[1].role, Role::Assistant);
    assert_eq!(stored.messages[1].content, "4");
}

#[tokio::test]
async fn follow_up_sends_full_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&["Hel", "lo"]), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let fixture = chat_fixture(&config_for(&server));
    let sink = RecordingSink::default();
    let mut conversation = Conversation::new();

    for text in ["hi", "again"] {
        fixture
            .engine
            .send(
                &mut conversation,
                TurnRequest::new(text, SAMURAI_MODEL),
                CancellationToken::new(),
                &sink,
            )
            .await
            .expect("turn should run");
    }

    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(requests.len(), 2);
    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(
        second["messages"],
        json!([
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": "Hello"},
            {"role": "user", "content": "again"}
        ])
    );

    let sessions = fixture.store.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].messages.len(), 4);
    assert_eq!(Some(sessions[0].id.as_str()), conversation.session_id());
}

#[tokio::test]
async fn non_streamed_answer_arrives_whole() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Paris"}}]
        })))
        .mount(&server)
        .await;

    let fixture = chat_fixture(&config_for(&server));
    let sink = RecordingSink::default();
    let mut conversation = Conversation::new();

    let outcome = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("Capital of France?", SAMURAI_MODEL).with_stream(false),
            CancellationToken::new(),
            &sink,
        )
        .await
        .unwrap();

    assert_eq!(outcome.state, TurnState::Done);
    assert_eq!(outcome.content, "Paris");
    assert_eq!(sink.text(), "Paris");
}

#[tokio::test]
async fn provider_error_message_replaces_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit exceeded"}
        })))
        .mount(&server)
        .await;

    let fixture = chat_fixture(&config_for(&server));
    let mut conversation = Conversation::new();

    let outcome = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("hello", SAMURAI_MODEL),
            CancellationToken::new(),
            &RecordingSink::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.state, TurnState::Error);
    assert_eq!(
        outcome.notice,
        Some(TurnNotice::Failed("Rate limit exceeded".into()))
    );
    assert_eq!(outcome.content, "Error: Rate limit exceeded");

    let stored = fixture
        .store
        .get_session(&outcome.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.messages[1].content, "Error: Rate limit exceeded");
}

#[tokio::test]
async fn unreachable_provider_uses_generic_message() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.providers.samurai_url = "http://127.0.0.1:1/v1/chat/completions".into();

    let fixture = chat_fixture(&config);
    let mut conversation = Conversation::new();
    let outcome = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("hello", SAMURAI_MODEL),
            CancellationToken::new(),
            &RecordingSink::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.state, TurnState::Error);
    assert_eq!(
        outcome.content,
        "Error: Failed to get response from AI. Please try again."
    );
}

#[tokio::test]
async fn samurai_v2_reply_is_replayed_as_fragments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RELAY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "Samurai Ai v2",
            "response": {"choices": [{"message": {"content": "Konnichiwa!"}}]},
            "message": "Response from Blackbox.ai (Samurai Ai v2)"
        })))
        .mount(&server)
        .await;

    let fixture = chat_fixture(&config_for(&server));
    let sink = RecordingSink::default();
    let mut conversation = Conversation::new();

    let outcome = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("greet me", "Samurai Ai v2"),
            CancellationToken::new(),
            &sink,
        )
        .await
        .unwrap();

    assert_eq!(outcome.content, "Konnichiwa!");
    let fragments: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|event| matches!(event, StreamEvent::TextDelta { .. }))
        .collect();
    assert_eq!(fragments.len(), 3);
    assert_eq!(sink.text(), "Konnichiwa!");
}

#[tokio::test]
async fn provider_override_reaches_models_outside_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&["ok"]), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let fixture = chat_fixture(&config_for(&server));
    let mut conversation = Conversation::new();

    let unknown = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("hi", "vendor/uncatalogued"),
            CancellationToken::new(),
            &RecordingSink::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(unknown, ChatError::UnknownModel(_)));
    assert!(conversation.messages().is_empty());

    let outcome = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("hi", "vendor/uncatalogued").with_provider(Some(ProviderKind::OpenRouter)),
            CancellationToken::new(),
            &RecordingSink::default(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.content, "ok");
}

#[tokio::test]
async fn blank_input_is_rejected_without_a_session() {
    let server = MockServer::start().await;
    let fixture = chat_fixture(&config_for(&server));
    let mut conversation = Conversation::new();

    let err = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("   ", SAMURAI_MODEL),
            CancellationToken::new(),
            &RecordingSink::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::EmptyInput));
    assert!(conversation.session_id().is_none());
    assert!(fixture.store.list_sessions().await.unwrap().is_empty());
}
