use super::Config;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

const HISTORY_DIR: &str = "history";
const HOSTED_DB_FILE: &str = "chats.db";

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let data_dir = home.join(".strawberry");
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).context("Failed to create .strawberry directory")?;
        }
        Self::load_from(&data_dir.join("config.toml"))
    }

    /// Load the config at `config_path`, writing defaults when it does not
    /// exist yet. Environment overrides are applied before validation.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let data_dir = config_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut config = if config_path.exists() {
            let contents =
                fs::read_to_string(config_path).context("Failed to read config file")?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|error| ConfigError::Load(error.to_string()))
                .context("Failed to parse config file")?;
            config.config_path = config_path.to_path_buf();
            config.data_dir = data_dir;
            config
        } else {
            let config = Self {
                config_path: config_path.to_path_buf(),
                data_dir,
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Validation(
                "max_tokens must be greater than 0".into(),
            ));
        }

        let endpoints = [
            ("providers.openrouter_url", &self.providers.openrouter_url),
            ("providers.typegpt_url", &self.providers.typegpt_url),
            ("providers.samurai_url", &self.providers.samurai_url),
            ("providers.samurai_v2_url", &self.providers.samurai_v2_url),
            ("providers.enhance_url", &self.providers.enhance_url),
            ("providers.app_url", &self.providers.app_url),
            ("image.url", &self.image.url),
            ("relay.groq_url", &self.relay.groq_url),
            ("relay.blackbox_url", &self.relay.blackbox_url),
        ];
        for (field, value) in endpoints {
            url::Url::parse(value).map_err(|error| {
                ConfigError::Validation(format!("{field} is not a valid URL ({value}): {error}"))
            })?;
        }

        if self.providers.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "providers.timeout_secs must be positive".into(),
            ));
        }
        if self.relay.upstream_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "relay.upstream_timeout_secs must be positive".into(),
            ));
        }
        if self.relay.host.trim().is_empty() {
            return Err(ConfigError::Validation("relay.host must not be empty".into()));
        }
        if self.storage.user_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage.user_id must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn history_dir(&self) -> PathBuf {
        self.storage
            .local_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(HISTORY_DIR))
    }

    pub fn hosted_db_path(&self) -> PathBuf {
        self.storage
            .hosted_db_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(HOSTED_DB_FILE))
    }
}
