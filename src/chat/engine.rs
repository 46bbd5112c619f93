use super::turn::{TurnNotice, TurnOutcome, TurnRequest, TurnState};
use crate::error::ChatError;
use crate::llm::{ChatReply, DoneReason, Dispatcher, StreamEvent, StreamSink};
use crate::session::{ChatSession, Message, SessionManager};
use chrono::Utc;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// In-memory state of one conversation.
///
/// Sending takes `&mut Conversation`, so a conversation never has more than
/// one request in flight.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    session_id: Option<String>,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue a stored session.
    pub fn resume(session: ChatSession) -> Self {
        Self {
            session_id: Some(session.id),
            messages: session.messages,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn placeholder_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut()
    }
}

pub struct ChatEngine {
    dispatcher: Arc<Dispatcher>,
    sessions: SessionManager,
}

impl ChatEngine {
    pub fn new(dispatcher: Arc<Dispatcher>, sessions: SessionManager) -> Self {
        Self {
            dispatcher,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Run one chat turn.
    ///
    /// Only input validation fails with `Err`, and it does so before the
    /// conversation is touched. Provider failures and cancellation are
    /// reported through the returned [`TurnOutcome`].
    pub async fn send(
        &self,
        conversation: &mut Conversation,
        request: TurnRequest,
        cancel: CancellationToken,
        sink: &dyn StreamSink,
    ) -> Result<TurnOutcome, ChatError> {
        let text = request.text.trim().to_string();
        if text.is_empty() && request.attachments.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        let route = self.dispatcher.resolve(&request.model, request.provider)?;

        let mut user = Message::user(text.clone());
        user.attachments = request.attachments;
        conversation.messages.push(user);
        let history_len = conversation.messages.len();
        conversation.messages.push(Message::assistant_placeholder());

        let session_id = match conversation.session_id.clone() {
            Some(id) => {
                self.sessions
                    .update_messages(&id, &conversation.messages)
                    .await;
                id
            }
            None => {
                let session = self
                    .sessions
                    .create_session(&text, conversation.messages.clone())
                    .await;
                conversation.session_id = Some(session.id.clone());
                session.id
            }
        };

        let chat_request =
            self.dispatcher
                .build_request(&route, &conversation.messages[..history_len], request.stream);
        let mut state = transition(&session_id, TurnState::Idle, TurnState::Sending);
        let mut notice = None;
        let mut signalled = false;

        match self
            .dispatcher
            .send(&route, &chat_request, cancel.clone())
            .await
        {
            Ok(ChatReply::Complete(content)) => {
                if let Some(placeholder) = conversation.placeholder_mut() {
                    placeholder.content.clone_from(&content);
                }
                sink.on_event(&StreamEvent::TextDelta { text: content }).await;
                sink.on_event(&StreamEvent::Done {
                    reason: DoneReason::EndOfStream,
                })
                .await;
                signalled = true;
                state = transition(&session_id, state, TurnState::Done);
            }
            Ok(ChatReply::Streaming(mut stream)) => {
                state = transition(&session_id, state, TurnState::Streaming);
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(StreamEvent::TextDelta { text }) => {
                            if let Some(placeholder) = conversation.placeholder_mut() {
                                placeholder.content.push_str(&text);
                            }
                            sink.on_event(&StreamEvent::TextDelta { text }).await;
                            self.sessions
                                .update_messages(&session_id, &conversation.messages)
                                .await;
                        }
                        Ok(event @ StreamEvent::Done { reason }) => {
                            sink.on_event(&event).await;
                            signalled = true;
                            if reason == DoneReason::Cancelled {
                                notice = Some(TurnNotice::Stopped);
                            }
                            state = transition(&session_id, state, TurnState::Done);
                            break;
                        }
                        Err(error) => {
                            state = fail_turn(conversation, &session_id, state, &error, &mut notice);
                            break;
                        }
                    }
                }
                if !state.is_terminal() {
                    state = transition(&session_id, state, TurnState::Done);
                }
            }
            Err(error) if error.is_cancelled() => {
                notice = Some(TurnNotice::Stopped);
                state = transition(&session_id, state, TurnState::Done);
            }
            Err(error) => {
                state = fail_turn(conversation, &session_id, state, &error, &mut notice);
            }
        }

        // The sink sees exactly one `Done` per turn, failures included.
        if !signalled {
            let reason = if notice == Some(TurnNotice::Stopped) {
                DoneReason::Cancelled
            } else {
                DoneReason::EndOfStream
            };
            sink.on_event(&StreamEvent::Done { reason }).await;
        }

        let content = match conversation.placeholder_mut() {
            Some(placeholder) => {
                placeholder.created_at = Utc::now();
                placeholder.content.clone()
            }
            None => String::new(),
        };
        self.sessions
            .update_messages(&session_id, &conversation.messages)
            .await;

        Ok(TurnOutcome {
            state,
            session_id,
            content,
            notice,
        })
    }
}

fn transition(session_id: &str, from: TurnState, to: TurnState) -> TurnState {
    tracing::debug!(session_id, %from, %to, "chat turn state");
    to
}

fn fail_turn(
    conversation: &mut Conversation,
    session_id: &str,
    from: TurnState,
    error: &ChatError,
    notice: &mut Option<TurnNotice>,
) -> TurnState {
    let message = error.user_message();
    tracing::warn!(session_id, "chat turn failed: {error}");
    if let Some(placeholder) = conversation.placeholder_mut() {
        placeholder.content = format!("Error: {message}");
    }
    *notice = Some(TurnNotice::Failed(message));
    transition(session_id, from, TurnState::Error)
}
