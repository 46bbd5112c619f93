// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod scrub;
pub mod sse;
pub mod streaming;
pub mod traits;
pub mod types;

// ── Routing ─────────────────────────────────────────────────────────────────
pub mod catalog;
pub mod dispatch;

// ── Provider implementations ────────────────────────────────────────────────
pub mod compatible;
pub mod enhance;
pub mod samurai_v2;

// ── Infrastructure re-exports ───────────────────────────────────────────────
pub use http_client::{
    CHAT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, build_provider_client,
    build_provider_client_with_timeout,
};
pub use scrub::{ErrorEnvelope, api_error, sanitize_api_error, scrub_secret_patterns};
pub use sse::{SseDecoder, SseEvent};
pub use streaming::{
    CliStreamSink, DoneReason, FragmentStream, NullStreamSink, StreamCollector, StreamEvent,
    StreamSink, collect_text, decode_sse_stream, simulate_stream,
};
pub use traits::{ChatProvider, ChatReply};
pub use types::{ChatRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, WireMessage};

// ── Routing + provider re-exports ───────────────────────────────────────────
pub use catalog::{MODELS, Model, default_model, find_model, select_best_model};
pub use compatible::OpenAiCompatibleProvider;
pub use dispatch::{Dispatcher, ProviderKind, Route};
pub use enhance::PromptEnhancer;
pub use samurai_v2::{SAMURAI_V2_MODEL, SamuraiV2Provider, random_message_id};
