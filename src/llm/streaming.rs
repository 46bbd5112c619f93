use super::sse::{SseDecoder, SseEvent};
use crate::error::ChatError;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Lazy, finite, non-restartable sequence of fragments.
///
/// The last item is always exactly one of `Ok(StreamEvent::Done { .. })` or
/// `Err(_)`; nothing is yielded after it.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ChatError>> + Send>>;

/// Characters per fragment when replaying a complete response.
pub const SIMULATED_CHUNK_CHARS: usize = 5;
/// Pause between replayed fragments.
pub const SIMULATED_CHUNK_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoneReason {
    /// The provider sent `data: [DONE]`.
    Sentinel,
    /// The body ended without a sentinel.
    EndOfStream,
    /// The caller cancelled the request.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEvent {
    TextDelta { text: String },
    Done { reason: DoneReason },
}

pub trait StreamSink: Send + Sync {
    fn on_event<'a>(
        &'a self,
        event: &'a StreamEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

#[derive(Debug, Default)]
pub struct NullStreamSink;

impl StreamSink for NullStreamSink {
    fn on_event<'a>(
        &'a self,
        _event: &'a StreamEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }
}

/// Prints fragments to stdout as they arrive.
pub struct CliStreamSink {
    writer: Arc<dyn Fn(&str) + Send + Sync>,
}

impl CliStreamSink {
    pub fn new() -> Self {
        Self {
            writer: Arc::new(|text| {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            }),
        }
    }

    #[cfg(test)]
    fn with_writer(writer: Arc<dyn Fn(&str) + Send + Sync>) -> Self {
        Self { writer }
    }
}

impl Default for CliStreamSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSink for CliStreamSink {
    fn on_event<'a>(
        &'a self,
        event: &'a StreamEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            match event {
                StreamEvent::TextDelta { text } => (self.writer)(text),
                StreamEvent::Done { .. } => (self.writer)("\n"),
            }
        })
    }
}

#[derive(Debug, Default)]
pub struct StreamCollector {
    text: String,
    done: Option<DoneReason>,
}

impl StreamCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::TextDelta { text } => {
                if self.done.is_none() {
                    self.text.push_str(text);
                }
            }
            StreamEvent::Done { reason } => {
                self.done.get_or_insert(*reason);
            }
        }
    }

    pub fn done_reason(&self) -> Option<DoneReason> {
        self.done
    }

    pub fn finish(self) -> String {
        self.text
    }
}

/// Drain a stream into its full text.
pub async fn collect_text(mut stream: FragmentStream) -> Result<(String, DoneReason), ChatError> {
    let mut collector = StreamCollector::new();
    while let Some(event) = stream.next().await {
        collector.feed(&event?);
        if let Some(reason) = collector.done_reason() {
            return Ok((collector.finish(), reason));
        }
    }
    Ok((collector.finish(), DoneReason::EndOfStream))
}

/// Turn a byte stream carrying `text/event-stream` data into fragments.
///
/// Read errors end the stream with `Err`; cancellation ends it with
/// `Done { reason: Cancelled }` and suppresses any fragments still pending
/// from the chunk being processed.
pub fn decode_sse_stream<S, B, E>(
    provider: String,
    byte_stream: S,
    cancel: CancellationToken,
) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut decoder = SseDecoder::new();

        loop {
            let polled = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                next = byte_stream.next() => Some(next),
            };
            let Some(next) = polled else {
                yield Ok(StreamEvent::Done { reason: DoneReason::Cancelled });
                break;
            };

            let (events, at_end) = match next {
                Some(Ok(chunk)) => (decoder.push(chunk.as_ref()), false),
                Some(Err(error)) => {
                    yield Err(ChatError::transport(&provider, error));
                    break;
                }
                None => (decoder.finish(), true),
            };

            let mut terminal = None;
            for event in events {
                if cancel.is_cancelled() {
                    terminal = Some(DoneReason::Cancelled);
                    break;
                }
                match event {
                    SseEvent::Fragment(text) => yield Ok(StreamEvent::TextDelta { text }),
                    SseEvent::Done => {
                        terminal = Some(DoneReason::Sentinel);
                        break;
                    }
                }
            }
            if terminal.is_none() && at_end {
                terminal = Some(DoneReason::EndOfStream);
            }
            if let Some(reason) = terminal {
                yield Ok(StreamEvent::Done { reason });
                break;
            }
        }
    };

    Box::pin(stream)
}

/// Replay an already-complete response as a fragment stream.
pub fn simulate_stream(
    content: String,
    chunk_chars: usize,
    delay: Duration,
    cancel: CancellationToken,
) -> FragmentStream {
    let chunk_chars = chunk_chars.max(1);
    let stream = async_stream::stream! {
        let chars: Vec<char> = content.chars().collect();
        let mut cancelled = false;

        for (index, piece) in chars.chunks(chunk_chars).enumerate() {
            if index > 0 && !delay.is_zero() {
                let interrupted = tokio::select! {
                    biased;
                    () = cancel.cancelled() => true,
                    () = tokio::time::sleep(delay) => false,
                };
                if interrupted {
                    cancelled = true;
                    break;
                }
            }
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            yield Ok(StreamEvent::TextDelta { text: piece.iter().collect() });
        }

        let reason = if cancelled { DoneReason::Cancelled } else { DoneReason::EndOfStream };
        yield Ok(StreamEvent::Done { reason });
    };

    Box::pin(stream)
}
