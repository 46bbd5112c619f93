use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use strawberry::chat::{Conversation, TurnNotice, TurnRequest, TurnState};
use strawberry::llm::{DoneReason, StreamEvent, StreamSink};
use strawberry::session::SessionStore;

use super::chat_harness::{CHAT_PATH, RecordingSink, chat_fixture, config_for, sse_body};

const SAMURAI_MODEL: &str = "openai/gpt-4.1-mini";

/// Cancels the turn as soon as the first fragment is shown.
struct StopAfterFirstFragment {
    cancel: CancellationToken,
    inner: RecordingSink,
}

impl StreamSink for StopAfterFirstFragment {
    fn on_event<'a>(
        &'a self,
        event: &'a StreamEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.inner.on_event(event).await;
            if matches!(event, StreamEvent::TextDelta { .. }) {
                self.cancel.cancel();
            }
        })
    }
}

#[tokio::test]
async fn stop_mid_stream_keeps_partial_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["Once", " upon", " a time"]), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let fixture = chat_fixture(&config_for(&server));
    let cancel = CancellationToken::new();
    let sink = StopAfterFirstFragment {
        cancel: cancel.clone(),
        inner: RecordingSink::default(),
    };
    let mut conversation = Conversation::new();

    let outcome = fixture
        .engine
        .send(
            &mut conversation,
            TurnRequest::new("tell me a story", SAMURAI_MODEL),
            cancel,
            &sink,
        )
        .await
        .unwrap();

    assert_eq!(outcome.state, TurnState::Done);
    assert_eq!(outcome.notice, Some(TurnNotice::Stopped));
    assert_eq!(outcome.content, "Once");
    assert_eq!(
        sink.inner.events().last(),
        Some(&StreamEvent::Done {
            reason: DoneReason::Cancelled
        })
    );

    let stored = fixture
        .store
        .get_session(&outcome.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.messages[1].content, "Once");
}

#[tokio::test]
async fn stop_before_response_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["late"]), "text/event-stream")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let fixture = chat_fixture(&config_for(&server));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let mut conversation = Conversation::new();
    let sink = RecordingSink::default();
    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        fixture.engine.send(
            &mut conversation,
            TurnRequest::new("slow question", SAMURAI_MODEL),
            cancel,
            &sink,
        ),
    )
    .await
    .expect("cancellation should end the turn promptly")
    .unwrap();

    assert_eq!(outcome.state, TurnState::Done);
    assert_eq!(outcome.notice, Some(TurnNotice::Stopped));
    assert_eq!(outcome.content, "");
    assert_eq!(conversation.messages().len(), 2);
    assert_eq!(
        sink.events(),
        [StreamEvent::Done {
            reason: DoneReason::Cancelled
        }]
    );
}
