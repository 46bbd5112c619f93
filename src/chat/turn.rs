use crate::llm::ProviderKind;
use crate::session::Attachment;
use serde::Serialize;
use std::fmt;

/// One user submission.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub model: String,
    /// Bypass catalog routing (e.g. OpenRouter models outside the catalog).
    pub provider: Option<ProviderKind>,
    pub stream: bool,
}

impl TurnRequest {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
            model: model.into(),
            provider: None,
            stream: true,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Option<ProviderKind>) -> Self {
        self.provider = provider;
        self
    }

    #[must_use]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// `Idle -> Sending -> (Streaming -> Done) | Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TurnState {
    Idle,
    Sending,
    Streaming,
    Done,
    Error,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnNotice {
    /// The user cancelled; partial content was kept.
    Stopped,
    /// The provider or transport failed.
    Failed(String),
}

impl fmt::Display for TurnNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("Generation stopped"),
            Self::Failed(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: TurnState,
    pub session_id: String,
    /// Final content of the assistant message.
    pub content: String,
    pub notice: Option<TurnNotice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_render_user_text() {
        assert_eq!(TurnNotice::Stopped.to_string(), "Generation stopped");
        assert_eq!(
            TurnNotice::Failed("Rate limit exceeded".into()).to_string(),
            "Rate limit exceeded"
        );
    }

    #[test]
    fn only_done_and_error_are_terminal() {
        assert!(TurnState::Done.is_terminal());
        assert!(TurnState::Error.is_terminal());
        assert!(!TurnState::Streaming.is_terminal());
        assert_eq!(TurnState::Streaming.to_string(), "streaming");
    }
}
