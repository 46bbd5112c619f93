use super::catalog::find_model;
use super::compatible::OpenAiCompatibleProvider;
use super::samurai_v2::{SAMURAI_V2_MODEL, SamuraiV2Provider};
use super::traits::{ChatProvider, ChatReply};
use super::types::ChatRequest;
use crate::config::Config;
use crate::error::ChatError;
use crate::session::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum ProviderKind {
    #[serde(rename = "openrouter")]
    #[strum(serialize = "openrouter")]
    OpenRouter,
    #[serde(rename = "typegpt")]
    #[strum(serialize = "typegpt")]
    TypeGpt,
    #[serde(rename = "samurai")]
    #[strum(serialize = "samurai")]
    Samurai,
    #[serde(rename = "samurai-v2")]
    #[strum(serialize = "samurai-v2")]
    SamuraiV2,
}

impl ProviderKind {
    pub const ALL: [Self; 4] = [Self::OpenRouter, Self::TypeGpt, Self::Samurai, Self::SamuraiV2];
}

/// Where one request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub provider: ProviderKind,
    pub model: String,
}

/// Lookup table from provider kind to the strategy that talks to it.
pub struct Dispatcher {
    providers: HashMap<ProviderKind, Arc<dyn ChatProvider>>,
    default_provider: Option<ProviderKind>,
    temperature: f64,
    max_tokens: u32,
}

impl Dispatcher {
    pub fn from_config(config: &Config) -> Self {
        let p = &config.providers;
        let mut providers: HashMap<ProviderKind, Arc<dyn ChatProvider>> = HashMap::new();

        providers.insert(
            ProviderKind::OpenRouter,
            Arc::new(
                OpenAiCompatibleProvider::new(
                    "openrouter",
                    &p.openrouter_url,
                    p.openrouter_api_key.as_deref(),
                )
                .with_header("HTTP-Referer", &p.app_url)
                .with_header("X-Title", &p.app_title)
                .with_timeout(p.timeout_secs),
            ),
        );
        providers.insert(
            ProviderKind::TypeGpt,
            Arc::new(
                OpenAiCompatibleProvider::new(
                    "typegpt",
                    &p.typegpt_url,
                    p.typegpt_api_key.as_deref(),
                )
                .with_timeout(p.timeout_secs),
            ),
        );
        providers.insert(
            ProviderKind::Samurai,
            Arc::new(
                OpenAiCompatibleProvider::new(
                    "samurai",
                    &p.samurai_url,
                    p.samurai_api_key.as_deref(),
                )
                .with_timeout(p.timeout_secs),
            ),
        );
        providers.insert(
            ProviderKind::SamuraiV2,
            Arc::new(SamuraiV2Provider::new(&p.samurai_v2_url).with_timeout(p.timeout_secs)),
        );

        Self {
            providers,
            default_provider: config.default_provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Replace one entry of the table.
    #[must_use]
    pub fn with_provider(mut self, kind: ProviderKind, provider: Arc<dyn ChatProvider>) -> Self {
        self.providers.insert(kind, provider);
        self
    }

    /// Decide which provider serves `model`.
    ///
    /// `Samurai Ai v2` always goes to the relay. Otherwise an explicit
    /// override wins, then the catalog, then the configured default.
    pub fn resolve(
        &self,
        model: &str,
        provider_override: Option<ProviderKind>,
    ) -> Result<Route, ChatError> {
        let provider = if model == SAMURAI_V2_MODEL {
            Some(ProviderKind::SamuraiV2)
        } else {
            provider_override
                .or_else(|| find_model(model).map(|entry| entry.provider))
                .or(self.default_provider)
        };

        let provider = provider.ok_or_else(|| ChatError::UnknownModel(model.to_string()))?;
        tracing::debug!(model, %provider, "resolved chat route");
        Ok(Route {
            provider,
            model: model.to_string(),
        })
    }

    pub fn build_request(&self, route: &Route, history: &[Message], stream: bool) -> ChatRequest {
        ChatRequest::new(route.model.clone(), history)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_stream(stream)
    }

    /// One attempt, no retries.
    pub async fn send(
        &self,
        route: &Route,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ChatReply, ChatError> {
        let provider = self
            .providers
            .get(&route.provider)
            .ok_or_else(|| ChatError::UnknownModel(route.model.clone()))?;
        provider.send(request, cancel).await
    }
}
