use crate::cli::commands::{Cli, Commands, SessionsCommands};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::Config;
use crate::app::chat::{ChatOptions, run_chat};
use crate::app::status::render_status;
use crate::error::SessionError;
use crate::image::ImageClient;
use crate::llm::{MODELS, Model, PromptEnhancer, select_best_model};
use crate::llm::catalog::score_model;
use crate::session::{ChatSession, SessionManager, open_store};

const RANKED_MODELS_SHOWN: usize = 5;

pub async fn dispatch(cli: Cli, config: Arc<Config>) -> Result<()> {
    match cli.command {
        Commands::Chat {
            message,
            model,
            auto,
            provider,
            session,
            attach,
            no_stream,
        } => {
            let model = if auto {
                message
                    .as_deref()
                    .map(|text| select_best_model(text).id.to_string())
            } else {
                model
            };
            run_chat(
                config,
                ChatOptions {
                    message,
                    model,
                    provider,
                    session,
                    attachments: attach,
                    stream: !no_stream,
                },
            )
            .await
        }

        Commands::Sessions { sessions_command } => {
            let sessions = SessionManager::new(open_store(&config).await?);
            run_sessions(&sessions, sessions_command).await
        }

        Commands::Models { query } => {
            match query {
                Some(query) => print_ranked_models(&query),
                None => print_models(MODELS),
            }
            Ok(())
        }

        Commands::Image { prompt, output } => run_image(&config, &prompt, output).await,

        Commands::Enhance { prompt } => {
            let enhancer = PromptEnhancer::new(&config.providers.enhance_url);
            let enhanced = enhancer.enhance(&prompt, CancellationToken::new()).await?;
            println!("{enhanced}");
            Ok(())
        }

        Commands::Status => {
            println!("{}", render_status(&config));
            Ok(())
        }

        Commands::Relay { port, host } => {
            let port = port.unwrap_or(config.relay.port);
            let host = host.unwrap_or_else(|| config.relay.host.clone());
            if port == 0 {
                info!("Starting Strawberry relay on {host} (random port)");
            } else {
                info!("Starting Strawberry relay on {host}:{port}");
            }
            crate::relay::run_relay(&host, port, config.relay.clone()).await
        }
    }
}

async fn run_sessions(sessions: &SessionManager, command: SessionsCommands) -> Result<()> {
    match command {
        SessionsCommands::List => {
            let all = sessions.list_sessions().await;
            if all.is_empty() {
                println!("No chat history yet.");
            }
            for session in &all {
                println!("{}", session_line(session));
            }
        }
        SessionsCommands::Show { id } => {
            let Some(session) = sessions.get_session(&id).await else {
                return Err(SessionError::NotFound(id).into());
            };
            println!("{}", session.title);
            for message in &session.messages {
                println!();
                println!("[{}] {}", message.role, message.created_at.format("%Y-%m-%d %H:%M"));
                println!("{}", message.content);
                for attachment in &message.attachments {
                    println!("  + {} ({}, {} bytes)", attachment.name, attachment.kind, attachment.size);
                }
            }
        }
        SessionsCommands::Delete { id } => {
            if !sessions.delete_session(&id).await {
                return Err(SessionError::NotFound(id).into());
            }
            println!("Deleted {id}");
        }
        SessionsCommands::Clear => {
            sessions.delete_all().await;
            println!("Chat history cleared.");
        }
    }
    Ok(())
}

fn session_line(session: &ChatSession) -> String {
    format!(
        "{}  {}  {:>3} msgs  {}",
        session.id,
        session.updated_at.format("%Y-%m-%d %H:%M"),
        session.messages.len(),
        session.title
    )
}

fn model_line(model: &Model) -> String {
    let mut flags = Vec::new();
    if model.supports_live_search {
        flags.push("live-search");
    }
    if model.is_reasoning {
        flags.push("reasoning");
    }
    if model.coming_soon {
        flags.push("coming-soon");
    }
    format!(
        "{:<48} {:<10} {}",
        model.id,
        model.provider.to_string(),
        flags.join(",")
    )
}

fn print_models(models: &[Model]) {
    for model in models {
        println!("{}", model_line(model));
    }
}

fn print_ranked_models(query: &str) {
    let best = select_best_model(query);
    println!("Best match: {}", best.id);
    println!();

    let mut ranked: Vec<(&Model, i32)> = MODELS
        .iter()
        .filter(|model| !model.coming_soon)
        .map(|model| (model, score_model(model, query)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    for (model, score) in ranked.into_iter().take(RANKED_MODELS_SHOWN) {
        println!("{score:>4}  {}", model_line(model));
    }
}

async fn run_image(config: &Config, prompt: &str, output: Option<PathBuf>) -> Result<()> {
    let client = ImageClient::new(config.image.clone());
    let image = client.generate(prompt).await?;

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "strawberry-image.{}",
            image.extension().unwrap_or("bin")
        ))
    });
    tokio::fs::write(&path, &image.bytes)
        .await
        .with_context(|| format!("write image to {}", path.display()))?;

    if let Some(revised) = &image.revised_prompt {
        println!("Prompt: {revised}");
    }
    println!("Saved {} ({} bytes)", path.display(), image.bytes.len());
    Ok(())
}
