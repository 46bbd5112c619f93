use super::streaming::FragmentStream;
use super::types::ChatRequest;
use crate::error::ChatError;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// What a provider hands back for one request.
pub enum ChatReply {
    /// The whole answer, read from a single JSON body.
    Complete(String),
    /// Incremental fragments, ending in exactly one `Done` or error.
    Streaming(FragmentStream),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

pub trait ChatProvider: Send + Sync {
    /// Provider identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Send a completion request.
    ///
    /// Cancelling `cancel` before the response headers arrive resolves to
    /// `ChatError::Cancelled`; after that, the returned stream observes it.
    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<ChatReply, ChatError>> + Send + 'a>>;
}
