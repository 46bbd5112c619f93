use crate::llm::ProviderKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `Strawberry AI` - streaming chat client for third-party LLM APIs.
#[derive(Parser, Debug)]
#[command(name = "strawberry")]
#[command(version)]
#[command(about = "Chat with many LLM providers from the terminal.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with a model (interactive unless --message is given)
    Chat {
        /// Single message mode (don't enter interactive mode)
        #[arg(short, long)]
        message: Option<String>,

        /// Model id from the catalog, or any id with --provider
        #[arg(long)]
        model: Option<String>,

        /// Pick the catalog model that best fits the message
        #[arg(long, conflicts_with = "model", requires = "message")]
        auto: bool,

        /// Provider to use (openrouter, typegpt, samurai, samurai-v2)
        #[arg(short, long, value_parser = parse_provider)]
        provider: Option<ProviderKind>,

        /// Continue a stored session
        #[arg(short, long)]
        session: Option<String>,

        /// Attach a local file (repeatable)
        #[arg(short, long = "attach")]
        attach: Vec<PathBuf>,

        /// Ask for a single JSON answer instead of a stream
        #[arg(long)]
        no_stream: bool,
    },

    /// Manage stored chat sessions
    Sessions {
        #[command(subcommand)]
        sessions_command: SessionsCommands,
    },

    /// List catalog models
    Models {
        /// Rank models for a free-text query instead of listing all
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Generate an image from a prompt
    Image {
        prompt: String,

        /// Output file (extension is taken from the image type when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite a prompt into a more detailed one
    Enhance { prompt: String },

    /// Show configuration and credential status
    Status,

    /// Start the relay server (enhance-prompt, samurai-v2)
    Relay {
        /// Port to listen on (use 0 for random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
}

fn parse_provider(value: &str) -> Result<ProviderKind, String> {
    value.parse().map_err(|_| {
        let known: Vec<String> = ProviderKind::ALL.iter().map(ToString::to_string).collect();
        format!("unknown provider '{value}' (expected one of: {})", known.join(", "))
    })
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionsCommands {
    /// List sessions, most recently updated first
    List,
    /// Print every message of a session
    Show {
        /// Session id
        id: String,
    },
    /// Delete one session
    Delete {
        /// Session id
        id: String,
    },
    /// Delete every session
    Clear,
}
