//! HTTP relay hosting the `enhance-prompt` and `samurai-v2` functions.
//!
//! Both endpoints forward to a third-party API with credentials that live
//! only in the relay's config, so the chat client never holds them.
//! Bodies are capped at 64 KiB and requests time out after 30 s; upstream
//! calls use `relay.upstream_timeout_secs`.

mod handlers;
mod server;

pub use server::{build_app, run_relay, run_relay_with_listener};

use crate::config::RelayConfig;
use crate::llm::build_provider_client_with_timeout;
use reqwest::Client;
use std::sync::Arc;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<RelayConfig>,
    pub client: Client,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            client: build_provider_client_with_timeout(config.upstream_timeout_secs),
            config: Arc::new(config),
        }
    }
}
