use super::handlers::{
    handle_enhance_prompt, handle_health, handle_method_not_allowed, handle_samurai_v2,
};
use super::{MAX_BODY_SIZE, REQUEST_TIMEOUT_SECS, RelayState};

use crate::config::RelayConfig;
use crate::error::RelayError;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, StatusCode, header},
    routing::{get, post},
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Bind `host:port` and serve the relay until the process exits.
pub async fn run_relay(host: &str, port: u16, config: RelayConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|error| RelayError::Bind {
            addr: format!("{host}:{port}"),
            message: error.to_string(),
        })?;

    run_relay_with_listener(host, listener, config).await
}

/// Run the relay from a pre-bound listener.
pub async fn run_relay_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    config: RelayConfig,
) -> Result<()> {
    let actual_port = listener
        .local_addr()
        .context("get relay listener local address")?
        .port();
    let display_addr = format!("{host}:{actual_port}");

    print_relay_banner(&display_addr, &config);
    tracing::info!(addr = %display_addr, "relay listening");

    let app = build_app(RelayState::new(config));
    axum::serve(listener, app).await.context("serve HTTP relay")?;

    Ok(())
}

fn print_relay_banner(display_addr: &str, config: &RelayConfig) {
    println!("Relay listening on {display_addr}");
    println!("  POST /api/enhance-prompt");
    println!("  POST /api/samurai-v2");
    println!("  GET  /health");
    if config.groq_api_key.is_none() {
        println!("  Groq API key not configured");
    }
    if config.blackbox_session_token.is_none() {
        println!("  Blackbox session not configured");
    }
}

pub fn build_app(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/api/enhance-prompt",
            post(handle_enhance_prompt).fallback(handle_method_not_allowed),
        )
        .route(
            "/api/samurai-v2",
            post(handle_samurai_v2).fallback(handle_method_not_allowed),
        )
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
}
