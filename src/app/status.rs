use crate::config::{Config, StorageBackend};

fn credential(key: Option<&String>) -> &'static str {
    if key.is_some_and(|k| !k.trim().is_empty()) {
        "set"
    } else {
        "missing"
    }
}

pub fn render_status(config: &Config) -> String {
    let provider = config
        .default_provider
        .map_or_else(|| "(catalog)".to_string(), |kind| kind.to_string());
    let storage = match config.storage.backend {
        StorageBackend::Local => format!("local ({})", config.history_dir().display()),
        StorageBackend::Hosted => format!(
            "hosted ({}, user {})",
            config.hosted_db_path().display(),
            config.storage.user_id
        ),
    };

    let providers = &config.providers;
    [
        "Strawberry AI Status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        format!("Storage     {storage}"),
        String::new(),
        format!("Provider    {provider}"),
        format!(
            "Model       {}",
            config.default_model.as_deref().unwrap_or("(default)")
        ),
        format!(
            "Sampling    temperature={}, max_tokens={}",
            config.temperature, config.max_tokens
        ),
        String::new(),
        "Credentials".to_string(),
        format!(
            "  openrouter  {}",
            credential(providers.openrouter_api_key.as_ref())
        ),
        format!(
            "  typegpt     {}",
            credential(providers.typegpt_api_key.as_ref())
        ),
        format!(
            "  samurai     {}",
            credential(providers.samurai_api_key.as_ref())
        ),
        format!("  image       {}", credential(config.image.api_key.as_ref())),
        format!(
            "  groq        {}",
            credential(config.relay.groq_api_key.as_ref())
        ),
        String::new(),
        format!("Relay       {}:{}", config.relay.host, config.relay.port),
        format!("  samurai-v2  {}", providers.samurai_v2_url),
        format!("  enhance     {}", providers.enhance_url),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reports_missing_credentials() {
        let status = render_status(&Config::default());
        assert!(status.contains("openrouter  missing"));
        assert!(status.contains("Relay       127.0.0.1:8888"));
        assert!(status.contains("Storage     local"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let mut config = Config::default();
        config.providers.typegpt_api_key = Some("  ".into());
        config.providers.samurai_api_key = Some("sk-samurai".into());
        let status = render_status(&config);
        assert!(status.contains("typegpt     missing"));
        assert!(status.contains("samurai     set"));
    }
}
