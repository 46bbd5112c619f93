//! Terminal front end for chat turns: one-shot and interactive.

use crate::Config;
use crate::app::attachments::{load_attachments, with_attachment_marker};
use crate::chat::{ChatEngine, Conversation, TurnNotice, TurnOutcome, TurnRequest};
use crate::error::{ChatError, SessionError};
use crate::llm::{CliStreamSink, Dispatcher, ProviderKind, StreamSink, default_model};
use crate::session::{SessionManager, open_store};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub message: Option<String>,
    pub model: Option<String>,
    pub provider: Option<ProviderKind>,
    pub session: Option<String>,
    pub attachments: Vec<PathBuf>,
    pub stream: bool,
}

/// Model used when neither the command line nor the config names one.
pub fn configured_model(config: &Config, model: Option<String>) -> String {
    model
        .or_else(|| config.default_model.clone())
        .unwrap_or_else(|| default_model().id.to_string())
}

pub async fn run_chat(config: Arc<Config>, options: ChatOptions) -> Result<()> {
    let store = open_store(&config).await?;
    let engine = ChatEngine::new(
        Arc::new(Dispatcher::from_config(&config)),
        SessionManager::new(store),
    );

    let mut conversation = match &options.session {
        Some(id) => engine
            .sessions()
            .get_session(id)
            .await
            .map(Conversation::resume)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?,
        None => Conversation::new(),
    };

    let attachments = load_attachments(&options.attachments)?;

    let mut model = configured_model(&config, options.model.clone());
    let sink = CliStreamSink::new();

    if let Some(message) = options.message {
        let text = with_attachment_marker(&message, &attachments);
        let request = TurnRequest::new(text, model)
            .with_provider(options.provider)
            .with_stream(options.stream)
            .with_attachments(attachments);
        let outcome = run_turn(&engine, &mut conversation, request, &sink).await?;
        report_outcome(&outcome);
        return Ok(());
    }

    println!("Strawberry AI ({model}). Ctrl-C stops a reply; /exit quits.");
    let mut pending_attachments = attachments;
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        prompt().await;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let line = line.trim();

        match line {
            "" => continue,
            "/exit" | "/quit" => break,
            "/new" => {
                conversation = Conversation::new();
                println!("Started a new chat.");
                continue;
            }
            _ => {}
        }
        if let Some(id) = line.strip_prefix("/model ") {
            model = id.trim().to_string();
            println!("Model: {model}");
            continue;
        }

        let attachments = std::mem::take(&mut pending_attachments);
        let request = TurnRequest::new(with_attachment_marker(line, &attachments), model.clone())
            .with_provider(options.provider)
            .with_stream(options.stream)
            .with_attachments(attachments);
        match run_turn(&engine, &mut conversation, request, &sink).await {
            Ok(outcome) => report_outcome(&outcome),
            Err(error) => eprintln!("{error}"),
        }
    }

    if let Some(id) = conversation.session_id() {
        println!("Session saved: {id}");
    }
    Ok(())
}

async fn prompt() {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(b"> ").await;
    let _ = stdout.flush().await;
}

/// Cancel `cancel` on the first Ctrl-C.
fn spawn_interrupt_watcher(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received, stopping generation");
            cancel.cancel();
        }
    })
}

async fn run_turn(
    engine: &ChatEngine,
    conversation: &mut Conversation,
    request: TurnRequest,
    sink: &dyn StreamSink,
) -> Result<TurnOutcome, ChatError> {
    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone());
    let outcome = engine.send(conversation, request, cancel, sink).await;
    watcher.abort();
    outcome
}

fn report_outcome(outcome: &TurnOutcome) {
    match &outcome.notice {
        Some(TurnNotice::Stopped) => eprintln!("[{}]", TurnNotice::Stopped),
        Some(TurnNotice::Failed(message)) => eprintln!("Error: {message}"),
        None => {}
    }
    tracing::debug!(
        session_id = %outcome.session_id,
        state = %outcome.state,
        chars = outcome.content.chars().count(),
        "turn finished"
    );
}
