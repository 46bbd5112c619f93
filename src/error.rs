use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Strawberry.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide how to surface a failure; internal glue continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum StrawberryError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Chat / Provider ─────────────────────────────────────────────────
    #[error("chat: {0}")]
    Chat(#[from] ChatError),

    // ── Session persistence ─────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Image generation ────────────────────────────────────────────────
    #[error("image: {0}")]
    Image(#[from] ImageError),

    // ── Attachments ─────────────────────────────────────────────────────
    #[error("attachment: {0}")]
    Attachment(#[from] AttachmentError),

    // ── Relay server ────────────────────────────────────────────────────
    #[error("relay: {0}")]
    Relay(#[from] RelayError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Chat / Provider errors ─────────────────────────────────────────────────

/// Generic text shown for transport failures, where the underlying error
/// carries nothing useful for the user.
pub const GENERIC_CHAT_FAILURE: &str = "Failed to get response from AI. Please try again.";

#[derive(Debug, Error)]
pub enum ChatError {
    /// Network failure, connection reset, or a body read that broke mid-stream.
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    /// Non-2xx response; `message` is the provider's own error text when it
    /// sent one.
    #[error("{message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    /// The response envelope did not have the expected shape.
    #[error("{message}")]
    InvalidResponse { provider: String, message: String },

    #[error("Request was cancelled")]
    Cancelled,

    #[error("message is empty")]
    EmptyInput,

    #[error("Invalid model selected")]
    UnknownModel(String),
}

impl ChatError {
    pub fn transport(provider: &str, error: impl std::fmt::Display) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            message: error.to_string(),
        }
    }

    pub fn invalid_response(provider: &str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Text suitable for showing to the user in place of an assistant reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => GENERIC_CHAT_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(String),
}

// ─── Image errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("{0}")]
    Generation(String),

    #[error("No image URL in response")]
    MissingUrl,

    #[error("Failed to fetch generated image")]
    Fetch,
}

// ─── Attachment errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("You can only upload up to {max} files at a time")]
    TooMany { max: usize },

    #[error("File {name} is too large. Maximum size is 10MB.")]
    TooLarge { name: String },

    #[error("File type {kind} is not supported.")]
    Unsupported { kind: String },
}

// ─── Relay errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("bind {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error("upstream {upstream} failed: {message}")]
    Upstream { upstream: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, StrawberryError>;
