#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use wiremock::MockServer;

use strawberry::Config;
use strawberry::chat::ChatEngine;
use strawberry::llm::{Dispatcher, StreamEvent, StreamSink};
use strawberry::session::{LocalSessionStore, SessionManager, SessionStore};

pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const RELAY_PATH: &str = "/api/samurai-v2";

/// Config whose every provider endpoint points at `server`.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    let base = server.uri();
    config.providers.openrouter_url = format!("{base}{CHAT_PATH}");
    config.providers.typegpt_url = format!("{base}{CHAT_PATH}");
    config.providers.samurai_url = format!("{base}{CHAT_PATH}");
    config.providers.samurai_api_key = Some("sk-samurai".into());
    config.providers.samurai_v2_url = format!("{base}{RELAY_PATH}");
    config
}

pub struct ChatFixture {
    pub _tmp: TempDir,
    pub store: Arc<LocalSessionStore>,
    pub engine: ChatEngine,
}

pub fn chat_fixture(config: &Config) -> ChatFixture {
    let tmp = TempDir::new().expect("tempdir should be created");
    let store = Arc::new(LocalSessionStore::new(tmp.path()));
    let sessions = SessionManager::new(Arc::clone(&store) as Arc<dyn SessionStore>);
    let engine = ChatEngine::new(Arc::new(Dispatcher::from_config(config)), sessions);
    ChatFixture {
        _tmp: tmp,
        store,
        engine,
    }
}

/// Records every event it sees.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StreamEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().expect("sink lock").clone()
    }

    pub fn text(&self) -> String {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StreamEvent::TextDelta { text } => Some(text),
                StreamEvent::Done { .. } => None,
            })
            .collect()
    }
}

impl StreamSink for RecordingSink {
    fn on_event<'a>(
        &'a self,
        event: &'a StreamEvent,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.events.lock().expect("sink lock").push(event.clone());
        })
    }
}

/// `text/event-stream` body carrying one delta per fragment, then `[DONE]`.
pub fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let chunk = serde_json::json!({"choices": [{"delta": {"content": fragment}}]});
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}
