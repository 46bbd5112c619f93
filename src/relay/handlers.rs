use super::RelayState;
use crate::error::RelayError;
use crate::llm::SAMURAI_V2_MODEL;
use crate::llm::random_message_id;
use crate::llm::scrub::{ErrorEnvelope, extract_error_message, sanitize_api_error};
use crate::llm::types::completion_text;
use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde_json::{Map, Value, json};

const ENHANCER_SYSTEM_PROMPT: &str = "You are a prompt enhancer. Your task is to improve the given prompt by making it more detailed, structured, and effective for an AI model. Add relevant details, context, and specific instructions. Output ONLY the enhanced prompt text. Do not add any explanations, formatting, quotation marks, or additional text.";
const ENHANCER_TEMPERATURE: f64 = 0.7;
const UPSTREAM_MAX_TOKENS: u32 = 1024;

const GROQ: &str = "Groq";
const BLACKBOX: &str = "Blackbox";
const BLACKBOX_ORIGIN: &str = "https://www.blackbox.ai";
const BLACKBOX_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn upstream_failure(message: &str, error: &RelayError) -> Response {
    let details = match error {
        RelayError::Upstream { message, .. } => message.clone(),
        other => other.to_string(),
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message, "details": details })),
    )
        .into_response()
}

fn upstream_error(upstream: &str, message: impl Into<String>) -> RelayError {
    RelayError::Upstream {
        upstream: upstream.to_string(),
        message: message.into(),
    }
}

/// Turn a non-2xx upstream answer into a relay error carrying its message.
async fn failed_upstream(upstream: &str, response: reqwest::Response) -> RelayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| extract_error_message(&value, ErrorEnvelope::OpenAi))
        .map_or_else(
            || format!("Request failed with status code {}", status.as_u16()),
            |message| sanitize_api_error(&message),
        );
    upstream_error(upstream, message)
}

/// GET /health
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Any method other than POST on a function path.
pub(super) async fn handle_method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// POST /api/enhance-prompt: `{prompt}` -> `{enhancedPrompt}`
pub(super) async fn handle_enhance_prompt(
    State(state): State<RelayState>,
    body: Bytes,
) -> Response {
    let prompt = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| value.get("prompt").and_then(Value::as_str).map(str::to_owned))
        .filter(|prompt| !prompt.is_empty());
    let Some(prompt) = prompt else {
        return error_response(StatusCode::BAD_REQUEST, "Prompt is required");
    };

    match request_enhancement(&state, &prompt).await {
        Ok(Some(enhanced)) => Json(json!({ "enhancedPrompt": enhanced })).into_response(),
        Ok(None) => {
            tracing::warn!("Groq returned an empty enhancement");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get enhanced prompt from Groq API",
            )
        }
        Err(error) => {
            tracing::error!("Groq API error: {error}");
            upstream_failure("Error communicating with Groq API", &error)
        }
    }
}

async fn request_enhancement(
    state: &RelayState,
    prompt: &str,
) -> Result<Option<String>, RelayError> {
    let config = &state.config;
    let body = json!({
        "messages": [
            { "role": "system", "content": ENHANCER_SYSTEM_PROMPT },
            { "role": "user", "content": prompt },
        ],
        "model": config.groq_model,
        "temperature": ENHANCER_TEMPERATURE,
        "max_tokens": UPSTREAM_MAX_TOKENS,
    });

    let mut request = state.client.post(&config.groq_url).json(&body);
    match &config.groq_api_key {
        Some(key) => request = request.bearer_auth(key),
        None => tracing::warn!("Groq API key not configured, sending request without credentials"),
    }

    let response = request
        .send()
        .await
        .map_err(|error| upstream_error(GROQ, error.to_string()))?;
    if !response.status().is_success() {
        return Err(failed_upstream(GROQ, response).await);
    }

    let value: Value = response
        .json()
        .await
        .map_err(|error| upstream_error(GROQ, error.to_string()))?;
    Ok(completion_text(&value).filter(|text| !text.is_empty()))
}

/// POST /api/samurai-v2: `{messages}` -> `{model, response, message}`
pub(super) async fn handle_samurai_v2(State(state): State<RelayState>, body: Bytes) -> Response {
    let messages = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|mut value| value.get_mut("messages").map(Value::take))
        .and_then(|messages| match messages {
            Value::Array(items) => Some(items),
            _ => None,
        });
    let Some(messages) = messages else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid request format. Messages array is required.",
        );
    };

    match forward_to_blackbox(&state, messages).await {
        Ok(response) => Json(json!({
            "model": SAMURAI_V2_MODEL,
            "response": response,
            "message": "Response from Blackbox.ai (Samurai Ai v2)",
        }))
        .into_response(),
        Err(error) => {
            tracing::error!("Blackbox API error: {error}");
            upstream_failure("Error communicating with Blackbox API", &error)
        }
    }
}

/// Blackbox message list: `{id, content, role}`, keeping caller ids.
fn blackbox_messages(messages: Vec<Value>) -> Vec<Value> {
    messages
        .into_iter()
        .map(|message| {
            let id = message
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map_or_else(random_message_id, str::to_owned);
            json!({
                "id": id,
                "content": message.get("content").cloned().unwrap_or(Value::Null),
                "role": message.get("role").cloned().unwrap_or(Value::Null),
            })
        })
        .collect()
}

fn blackbox_payload(state: &RelayState, messages: Vec<Value>) -> Value {
    let mut payload = Map::new();
    payload.insert("messages".into(), Value::Array(blackbox_messages(messages)));
    payload.insert("agentMode".into(), json!({}));
    payload.insert("id".into(), Value::String(random_message_id()));
    payload.insert("codeModelMode".into(), Value::Bool(true));
    payload.insert("maxTokens".into(), json!(UPSTREAM_MAX_TOKENS));
    payload.insert("isMemoryEnabled".into(), Value::Bool(true));
    if let Some(validated) = &state.config.blackbox_validated {
        payload.insert("validated".into(), Value::String(validated.clone()));
    }
    payload.insert(
        "webSearchModeOption".into(),
        json!({ "autoMode": true, "webMode": false, "offlineMode": false }),
    );
    payload.insert("isPremium".into(), Value::Bool(true));
    Value::Object(payload)
}

fn blackbox_cookie(state: &RelayState) -> Option<String> {
    let config = &state.config;
    let parts: Vec<String> = [
        config
            .blackbox_session_id
            .as_deref()
            .map(|id| format!("sessionId={id}")),
        config
            .blackbox_session_token
            .as_deref()
            .map(|token| format!("__Secure-authjs.session-token={token}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}

/// Upstream JSON passes through; plain text is wrapped as a completion.
/// Upstream answers that already carry `choices` pass through; anything
/// else, including bare JSON scalars such as `4`, is wrapped as raw text.
fn provider_shaped(text: String) -> Value {
    match serde_json::from_str::<Value>(&text) {
        Ok(value) if value.get("choices").is_some() => value,
        _ => json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }),
    }
}

async fn forward_to_blackbox(state: &RelayState, messages: Vec<Value>) -> Result<Value, RelayError> {
    let payload = blackbox_payload(state, messages);

    let mut request = state
        .client
        .post(&state.config.blackbox_url)
        .header(header::ACCEPT, "*/*")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.8")
        .header(header::ORIGIN, BLACKBOX_ORIGIN)
        .header(header::REFERER, format!("{BLACKBOX_ORIGIN}/"))
        .header(header::USER_AGENT, BLACKBOX_USER_AGENT)
        .json(&payload);
    match blackbox_cookie(state) {
        Some(cookie) => request = request.header(header::COOKIE, cookie),
        None => tracing::warn!("Blackbox session not configured, sending request without cookie"),
    }

    let response = request
        .send()
        .await
        .map_err(|error| upstream_error(BLACKBOX, error.to_string()))?;
    if !response.status().is_success() {
        return Err(failed_upstream(BLACKBOX, response).await);
    }

    let text = response
        .text()
        .await
        .map_err(|error| upstream_error(BLACKBOX, error.to_string()))?;
    Ok(provider_shaped(text))
}
