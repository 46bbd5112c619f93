use super::http_client::build_provider_client;
use super::scrub::{ErrorEnvelope, extract_error_message, sanitize_api_error};
use crate::error::ChatError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

const ENHANCER: &str = "enhance-prompt";
const FALLBACK_ERROR: &str = "Failed to enhance prompt";
const MISSING_PROMPT: &str = "No enhanced prompt returned from API";

#[derive(Debug, Serialize)]
struct EnhanceRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnhanceResponse {
    #[serde(default)]
    enhanced_prompt: Option<String>,
}

/// Rewrites short image prompts into detailed ones through the relay.
pub struct PromptEnhancer {
    url: String,
    client: Client,
}

impl PromptEnhancer {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: build_provider_client(),
        }
    }

    pub async fn enhance(&self, prompt: &str, cancel: CancellationToken) -> Result<String, ChatError> {
        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            sent = self.client.post(&self.url).json(&EnhanceRequest { prompt }).send() => sent,
        };
        let response = sent.map_err(|error| ChatError::transport(ENHANCER, error))?;
        let status = response.status();

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            body = response.text() => body,
        };
        let body = body.map_err(|error| ChatError::transport(ENHANCER, error))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|value| extract_error_message(&value, ErrorEnvelope::Relay))
                .map_or_else(|| FALLBACK_ERROR.to_string(), |m| sanitize_api_error(&m));
            tracing::error!(status = status.as_u16(), "prompt enhancement failed: {message}");
            return Err(ChatError::Provider {
                provider: ENHANCER.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<EnhanceResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.enhanced_prompt)
            .filter(|enhanced| !enhanced.trim().is_empty())
            .ok_or_else(|| ChatError::invalid_response(ENHANCER, MISSING_PROMPT))
    }
}
