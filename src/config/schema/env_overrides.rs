use super::Config;
use std::str::FromStr;

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Some(provider) = non_empty("STRAWBERRY_PROVIDER") {
            match crate::llm::ProviderKind::from_str(&provider) {
                Ok(kind) => self.default_provider = Some(kind),
                Err(_) => tracing::warn!(provider, "Ignoring unknown STRAWBERRY_PROVIDER"),
            }
        }

        if let Some(model) = non_empty("STRAWBERRY_MODEL") {
            self.default_model = Some(model);
        }

        if let Some(temp_str) = non_empty("STRAWBERRY_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=2.0).contains(&temp)
        {
            self.temperature = temp;
        }

        if let Some(key) = non_empty("OPENROUTER_API_KEY") {
            self.providers.openrouter_api_key = Some(key);
        }
        if let Some(key) = non_empty("TYPEGPT_API_KEY") {
            self.providers.typegpt_api_key = Some(key);
        }
        if let Some(key) = non_empty("SAMURAI_API_KEY") {
            self.providers.samurai_api_key = Some(key);
        }
        if let Some(key) = non_empty("GROQ_API_KEY") {
            self.relay.groq_api_key = Some(key);
        }
        if let Some(key) = non_empty("STRAWBERRY_IMAGE_API_KEY") {
            self.image.api_key = Some(key);
        }

        if let Some(host) = non_empty("STRAWBERRY_RELAY_HOST") {
            self.relay.host = host;
        }
        if let Some(port_str) = non_empty("STRAWBERRY_RELAY_PORT")
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.relay.port = port;
        }
    }
}
