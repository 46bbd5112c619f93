use crate::llm::{CHAT_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, ProviderKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (`~/.strawberry`) - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Provider used when the model is not in the catalog.
    #[serde(default)]
    pub default_provider: Option<ProviderKind>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub relay: RelayConfig,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            config_path: PathBuf::new(),
            default_provider: None,
            default_model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            providers: ProvidersConfig::default(),
            storage: StorageConfig::default(),
            image: ImageConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

// ── Providers ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_openrouter_url")]
    pub openrouter_url: String,
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default = "default_typegpt_url")]
    pub typegpt_url: String,
    #[serde(default)]
    pub typegpt_api_key: Option<String>,
    #[serde(default = "default_samurai_url")]
    pub samurai_url: String,
    #[serde(default)]
    pub samurai_api_key: Option<String>,
    /// Relay function serving the `Samurai Ai v2` model.
    #[serde(default = "default_samurai_v2_url")]
    pub samurai_v2_url: String,
    /// Relay function rewriting image prompts.
    #[serde(default = "default_enhance_url")]
    pub enhance_url: String,
    /// Sent to OpenRouter as `HTTP-Referer`.
    #[serde(default = "default_app_url")]
    pub app_url: String,
    /// Sent to OpenRouter as `X-Title`.
    #[serde(default = "default_app_title")]
    pub app_title: String,
    /// Whole-request ceiling for chat calls, streaming included.
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_chat_timeout_secs() -> u64 {
    CHAT_TIMEOUT_SECS
}

fn default_openrouter_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".into()
}

fn default_typegpt_url() -> String {
    "https://fast.typegpt.net/v1/chat/completions".into()
}

fn default_samurai_url() -> String {
    "https://newapi-9qln.onrender.com/v1/chat/completions".into()
}

fn default_samurai_v2_url() -> String {
    format!("http://127.0.0.1:{DEFAULT_RELAY_PORT}/api/samurai-v2")
}

fn default_enhance_url() -> String {
    format!("http://127.0.0.1:{DEFAULT_RELAY_PORT}/api/enhance-prompt")
}

fn default_app_url() -> String {
    "http://localhost:5173".into()
}

fn default_app_title() -> String {
    "Strawberry AI".into()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openrouter_url: default_openrouter_url(),
            openrouter_api_key: None,
            typegpt_url: default_typegpt_url(),
            typegpt_api_key: None,
            samurai_url: default_samurai_url(),
            samurai_api_key: None,
            samurai_v2_url: default_samurai_v2_url(),
            enhance_url: default_enhance_url(),
            app_url: default_app_url(),
            app_title: default_app_title(),
            timeout_secs: default_chat_timeout_secs(),
        }
    }
}

// ── Storage ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file in the data directory.
    #[default]
    Local,
    /// SQLite `chats` table scoped by user id.
    Hosted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory for the local history file (default: data dir)
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
    /// SQLite database for the hosted backend (default: `<data dir>/chats.db`)
    #[serde(default)]
    pub hosted_db_path: Option<PathBuf>,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

fn default_user_id() -> String {
    "local".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_dir: None,
            hosted_db_path: None,
            user_id: default_user_id(),
        }
    }
}

// ── Image generation ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_persona_id")]
    pub persona_id: String,
    #[serde(default = "default_chat_id")]
    pub chat_id: String,
    #[serde(default = "default_device_uuid")]
    pub device_uuid: String,
}

fn default_image_url() -> String {
    "https://api.amigochat.io/v1/images/generations".into()
}

fn default_image_model() -> String {
    "recraft-v3".into()
}

fn default_persona_id() -> String {
    "image-generator".into()
}

fn default_chat_id() -> String {
    "432f275e-76a4-294f-9ff3-a08ed1a3e56c".into()
}

fn default_device_uuid() -> String {
    "8d9ffae4-d504-40c1-adba-53abfcfa9923".into()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            url: default_image_url(),
            api_key: None,
            model: default_image_model(),
            persona_id: default_persona_id(),
            chat_id: default_chat_id(),
            device_uuid: default_device_uuid(),
        }
    }
}

// ── Relay server ─────────────────────────────────────────────────

pub const DEFAULT_RELAY_PORT: u16 = 8888;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_relay_host")]
    pub host: String,
    #[serde(default = "default_relay_port")]
    pub port: u16,
    #[serde(default = "default_groq_url")]
    pub groq_url: String,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_blackbox_url")]
    pub blackbox_url: String,
    /// `validated` token sent in every Blackbox payload.
    #[serde(default)]
    pub blackbox_validated: Option<String>,
    /// `sessionId` cookie value.
    #[serde(default)]
    pub blackbox_session_id: Option<String>,
    /// `__Secure-authjs.session-token` cookie value.
    #[serde(default)]
    pub blackbox_session_token: Option<String>,
    /// Ceiling for calls to Groq and Blackbox.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
}

fn default_relay_host() -> String {
    "127.0.0.1".into()
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_relay_port() -> u16 {
    DEFAULT_RELAY_PORT
}

fn default_groq_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".into()
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".into()
}

fn default_blackbox_url() -> String {
    "https://www.blackbox.ai/api/chat".into()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_relay_host(),
            port: default_relay_port(),
            groq_url: default_groq_url(),
            groq_api_key: None,
            groq_model: default_groq_model(),
            blackbox_url: default_blackbox_url(),
            blackbox_validated: None,
            blackbox_session_id: None,
            blackbox_session_token: None,
            upstream_timeout_secs: default_upstream_timeout_secs(),
        }
    }
}
