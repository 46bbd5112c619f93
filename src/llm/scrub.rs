use crate::error::ChatError;
use serde_json::Value;
use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;

const PREFIX_PATTERNS: [&str; 6] = ["sk-or-", "sk-", "gsk_", "hf_", "ya29.", "AIza"];

const MARKER_PATTERNS: [&str; 8] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "\"authorization\":\"Bearer ",
    "api_key=",
    "access_token=",
    "\"api_key\":\"",
    "\"access_token\":\"",
    "session-token=",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

fn scrub_after_marker(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Skip bare markers without a token value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, "[REDACTED]");
        search_from = start + "[REDACTED]".len();
    }
}

/// Scrub known secret-like token patterns from provider error strings.
///
/// Redacts provider keys in prefix form (`sk-`, `gsk_`, ...) and in
/// header/query/json form (`Authorization: Bearer ...`, `api_key=...`).
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for pattern in PREFIX_PATTERNS {
        scrub_after_marker(&mut scrubbed, pattern);
    }
    for marker in MARKER_PATTERNS {
        scrub_after_marker(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let end = scrubbed
        .char_indices()
        .nth(MAX_API_ERROR_CHARS)
        .map_or(scrubbed.len(), |(index, _)| index);
    format!("{}...", &scrubbed[..end])
}

/// Where a provider puts its human-readable error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorEnvelope {
    /// `error.message`, then `message`, then `error` as a string.
    OpenAi,
    /// `error`, then `details`.
    Relay,
}

/// Extract the error message a provider put in its response body, if any.
pub fn extract_error_message(body: &Value, envelope: ErrorEnvelope) -> Option<String> {
    let as_text = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(ToString::to_string)
    };

    match envelope {
        ErrorEnvelope::OpenAi => as_text(body.get("error").and_then(|error| error.get("message")))
            .or_else(|| as_text(body.get("message")))
            .or_else(|| as_text(body.get("error"))),
        ErrorEnvelope::Relay => {
            as_text(body.get("error")).or_else(|| as_text(body.get("details")))
        }
    }
}

/// Build a sanitized provider error from a failed HTTP response.
pub async fn api_error(
    provider: &str,
    response: reqwest::Response,
    envelope: ErrorEnvelope,
) -> ChatError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| extract_error_message(&value, envelope))
        .map_or_else(
            || format!("Failed to get response ({}) from {provider}", status.as_u16()),
            |message| sanitize_api_error(&message),
        );

    tracing::error!(provider, status = status.as_u16(), "provider API error: {message}");
    ChatError::Provider {
        provider: provider.to_string(),
        status: status.as_u16(),
        message,
    }
}
