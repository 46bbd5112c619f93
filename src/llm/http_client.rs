use reqwest::Client;
use std::time::Duration;

/// Whole-request ceiling for chat calls; long streamed answers need it.
pub const CHAT_TIMEOUT_SECS: u64 = 300;
/// Whole-request ceiling for image and enhancer calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("strawberry/", env!("CARGO_PKG_VERSION"));

pub fn build_provider_client() -> Client {
    build_provider_client_with_timeout(DEFAULT_TIMEOUT_SECS)
}

pub fn build_provider_client_with_timeout(timeout_secs: u64) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(timeout_secs)))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|error| {
            tracing::warn!("HTTP client setup failed, using defaults: {error}");
            Client::new()
        })
}
