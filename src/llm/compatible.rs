//! Provider speaking the OpenAI-compatible `/v1/chat/completions` API.
//! OpenRouter, TypeGPT and Samurai all share this shape; they differ only in
//! endpoint, credential and a couple of attribution headers.

use super::http_client::{CHAT_TIMEOUT_SECS, build_provider_client_with_timeout};
use super::scrub::{ErrorEnvelope, api_error};
use super::streaming::decode_sse_stream;
use super::traits::{ChatProvider, ChatReply};
use super::types::{ChatRequest, completion_text};
use crate::error::ChatError;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

const NON_STREAMED_INVALID: &str = "Invalid response format from API (non-streamed)";

pub struct OpenAiCompatibleProvider {
    pub(crate) name: String,
    pub(crate) url: String,
    /// Pre-computed `Bearer <key>` value.
    cached_auth: Option<String>,
    extra_headers: Vec<(String, String)>,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(name: &str, url: &str, api_key: Option<&str>) -> Self {
        let cached_auth = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| format!("Bearer {key}"));

        Self {
            name: name.to_string(),
            url: url.trim_end_matches('/').to_string(),
            cached_auth,
            extra_headers: Vec::new(),
            client: build_provider_client_with_timeout(CHAT_TIMEOUT_SECS),
        }
    }

    /// Add a header sent with every request (OpenRouter attribution).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers.push((name.to_string(), value.to_string()));
        self
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
        let accept = if request.stream {
            "text/event-stream"
        } else {
            "application/json"
        };

        let mut builder = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, accept)
            .json(request);

        match &self.cached_auth {
            Some(auth) => builder = builder.header(AUTHORIZATION, auth),
            None => tracing::warn!(
                provider = %self.name,
                "API key not configured, sending request without credentials"
            ),
        }
        for (name, value) in &self.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            stream = request.stream,
            "sending chat completion"
        );

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            sent = builder.send() => sent,
        };
        let response = sent.map_err(|error| ChatError::transport(&self.name, error))?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response, ErrorEnvelope::OpenAi).await);
        }

        if request.stream && !is_json_body(response.headers()) {
            return Ok(ChatReply::Streaming(decode_sse_stream(
                self.name.clone(),
                response.bytes_stream(),
                cancel,
            )));
        }

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            body = response.json::<Value>() => body,
        };
        let body = body.map_err(|error| {
            tracing::warn!(provider = %self.name, "completion body is not JSON: {error}");
            ChatError::invalid_response(&self.name, NON_STREAMED_INVALID)
        })?;

        completion_text(&body)
            .map(ChatReply::Complete)
            .ok_or_else(|| ChatError::invalid_response(&self.name, NON_STREAMED_INVALID))
    }
}

/// A streamed request may still be answered with a plain JSON body.
pub(crate) fn is_json_body(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("application/json"))
}

impl ChatProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<ChatReply, ChatError>> + Send + 'a>> {
        Box::pin(self.send_inner(request, cancel))
    }
}
