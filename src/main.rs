//! # Support Bot CLI (`support-bot`)
//!
//! Answers questions about a plain-text FAQ document.
//!
//! ## Usage
//!
//! ```bash
//! support-bot [--config ./config/bot.toml] [--document faq.txt] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `support-bot chat` | Interactive chat session on the terminal |
//! | `support-bot ask "<question>"` | Answer one question and exit |
//! | `support-bot sections` | Show how the document splits into sections |
//! | `support-bot serve` | Start the HTTP JSON API |
//!
//! ## Examples
//!
//! ```bash
//! # Check the document before loading any model
//! support-bot sections --document ./faq.txt
//!
//! # One question, with the retrieved section as JSON
//! support-bot ask "How long for a refund?" --json
//!
//! # Ask again, asking for more context
//! support-bot ask "How do I return an item?" --feedback "too vague"
//!
//! # Chat and keep a transcript
//! support-bot chat --transcript ./chat.json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use support_bot::{agent, chat, config, document, logging, server};

/// Support Bot: answers questions from a plain-text FAQ.
///
/// Settings are read from `--config`, or `./config/bot.toml` when present,
/// or built-in defaults (`faq.txt`, local models).
#[derive(Parser)]
#[command(
    name = "support-bot",
    about = "Support Bot: answers questions from a plain-text FAQ",
    version,
    long_about = "Support Bot splits a plain-text FAQ into paragraphs, finds the paragraph most \
    similar to each question with sentence embeddings, and extracts the answer from it with a \
    question-answering model."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `document.path` from the config.
    #[arg(long, global = true)]
    document: Option<PathBuf>,

    /// Debug-level logging (ignored when RUST_LOG is set).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session.
    ///
    /// Each line is a question. `/vague` and `/unhelpful` give feedback on
    /// the previous answer, `/history` reprints the conversation, and
    /// `/quit` (or EOF) ends the session.
    Chat {
        /// Write the conversation history as JSON to this file on exit.
        #[arg(long)]
        transcript: Option<PathBuf>,
    },

    /// Answer a single question.
    Ask {
        /// The question.
        query: String,

        /// Feedback label to apply to the answer: `too vague` or `not helpful`.
        #[arg(long)]
        feedback: Option<String>,

        /// Print the answer and retrieved section as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the document's sections.
    ///
    /// Loads and splits the document only; no model is loaded.
    Sections {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP JSON API.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let mut cfg = config::resolve_config(cli.config.as_deref())?;
    if let Some(path) = cli.document {
        cfg.document.path = path;
    }

    match cli.command {
        Commands::Chat { transcript } => {
            chat::run_chat_cli(&cfg, transcript.as_deref()).await?;
        }
        Commands::Ask {
            query,
            feedback,
            json,
        } => {
            agent::run_ask(&cfg, &query, feedback.as_deref(), json).await?;
        }
        Commands::Sections { json } => {
            document::run_sections(&cfg, json)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
