//! Text-to-image generation.
//!
//! The generation endpoint answers with a URL; the image itself is fetched in
//! a second request.

use crate::config::ImageConfig;
use crate::error::ImageError;
use crate::llm::build_provider_client;
use crate::llm::scrub::sanitize_api_error;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const GENERATION_FAILED: &str = "Failed to generate image";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEVICE_VERSION: &str = "1.1.11";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationRequest<'a> {
    chat_id: &'a str,
    prompt: &'a str,
    model: &'a str,
    persona_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedItem>,
}

#[derive(Debug, Deserialize)]
struct GeneratedItem {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub url: String,
    pub revised_prompt: Option<String>,
}

impl GeneratedImage {
    /// `data:<type>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }

    /// File extension matching the content type, if it is a known image type.
    pub fn extension(&self) -> Option<&'static str> {
        let essence = self.content_type.split(';').next().unwrap_or_default().trim();
        match essence {
            "image/png" => Some("png"),
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/webp" => Some("webp"),
            "image/gif" => Some("gif"),
            "image/svg+xml" => Some("svg"),
            _ => None,
        }
    }
}

pub struct ImageClient {
    config: ImageConfig,
    client: Client,
}

impl ImageClient {
    pub fn new(config: ImageConfig) -> Self {
        Self {
            config,
            client: build_provider_client(),
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageError> {
        let body = GenerationRequest {
            chat_id: &self.config.chat_id,
            prompt,
            model: &self.config.model,
            persona_id: &self.config.persona_id,
        };

        let mut builder = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, text/plain, */*")
            .header("x-device-language", "en")
            .header("x-device-platform", "web")
            .header("x-device-uuid", &self.config.device_uuid)
            .header("x-device-version", DEVICE_VERSION)
            .json(&body);
        match &self.config.api_key {
            Some(key) => builder = builder.header(AUTHORIZATION, format!("Bearer {key}")),
            None => tracing::warn!("image API key not configured, sending request without credentials"),
        }

        tracing::debug!(model = %self.config.model, "requesting image generation");
        let response = builder.send().await.map_err(|error| {
            tracing::error!("image generation request failed: {error}");
            ImageError::Generation(GENERATION_FAILED.into())
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|value| {
                    value
                        .get("error")
                        .and_then(|error| error.get("message"))
                        .and_then(Value::as_str)
                        .map(sanitize_api_error)
                })
                .unwrap_or_else(|| GENERATION_FAILED.to_string());
            tracing::error!(status = status.as_u16(), "image generation failed: {message}");
            return Err(ImageError::Generation(message));
        }

        let item = serde_json::from_str::<GenerationResponse>(&text)
            .ok()
            .and_then(|parsed| parsed.data.into_iter().next())
            .ok_or(ImageError::MissingUrl)?;
        let url = item
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ImageError::MissingUrl)?;

        let image = self.client.get(&url).send().await.map_err(|error| {
            tracing::error!(url, "generated image fetch failed: {error}");
            ImageError::Fetch
        })?;
        if !image.status().is_success() {
            tracing::error!(url, status = image.status().as_u16(), "generated image fetch failed");
            return Err(ImageError::Fetch);
        }
        let content_type = image
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = image.bytes().await.map_err(|_| ImageError::Fetch)?.to_vec();

        Ok(GeneratedImage {
            bytes,
            content_type,
            url,
            revised_prompt: item.revised_prompt,
        })
    }
}
