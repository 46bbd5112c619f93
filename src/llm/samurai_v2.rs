//! Client side of the `samurai-v2` relay function.
//!
//! The relay answers with one complete JSON document; when the caller asked
//! for streaming, the answer is replayed through [`simulate_stream`] so both
//! paths look the same to the chat turn.

use super::http_client::{CHAT_TIMEOUT_SECS, build_provider_client_with_timeout};
use super::scrub::{ErrorEnvelope, api_error};
use super::streaming::{SIMULATED_CHUNK_CHARS, SIMULATED_CHUNK_DELAY, simulate_stream};
use super::traits::{ChatProvider, ChatReply};
use super::types::{ChatRequest, completion_text};
use crate::error::ChatError;
use crate::session::Role;
use rand::Rng;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

pub const SAMURAI_V2_MODEL: &str = "Samurai Ai v2";
const INVALID_RESPONSE: &str = "Invalid response format from Samurai Ai v2 API";
const MESSAGE_ID_LEN: usize = 7;

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    messages: Vec<RelayMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    role: Role,
    content: &'a str,
    id: String,
}

/// Short random id in the format the upstream assigns to messages.
pub fn random_message_id() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(MESSAGE_ID_LEN)
        .map(char::from)
        .collect()
}

pub struct SamuraiV2Provider {
    url: String,
    client: Client,
}

impl SamuraiV2Provider {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: build_provider_client_with_timeout(CHAT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.client = build_provider_client_with_timeout(timeout_secs);
        self
    }

    async fn send_inner(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ChatReply, ChatError> {
        let body = RelayRequest {
            messages: request
                .messages
                .iter()
                .map(|message| RelayMessage {
                    role: message.role,
                    content: &message.content,
                    id: random_message_id(),
                })
                .collect(),
        };

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            sent = self.client.post(&self.url).json(&body).send() => sent,
        };
        let response = sent.map_err(|error| ChatError::transport(SAMURAI_V2_MODEL, error))?;

        if !response.status().is_success() {
            return Err(api_error(SAMURAI_V2_MODEL, response, ErrorEnvelope::Relay).await);
        }

        let payload = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            payload = response.json::<Value>() => payload,
        };
        let content = payload
            .ok()
            .and_then(|payload| payload.get("response").and_then(completion_text))
            .ok_or_else(|| ChatError::invalid_response(SAMURAI_V2_MODEL, INVALID_RESPONSE))?;

        if request.stream {
            Ok(ChatReply::Streaming(simulate_stream(
                content,
                SIMULATED_CHUNK_CHARS,
                SIMULATED_CHUNK_DELAY,
                cancel,
            )))
        } else {
            Ok(ChatReply::Complete(content))
        }
    }
}

impl ChatProvider for SamuraiV2Provider {
    fn name(&self) -> &str {
        SAMURAI_V2_MODEL
    }

    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<ChatReply, ChatError>> + Send + 'a>> {
        Box::pin(self.send_inner(request, cancel))
    }
}
