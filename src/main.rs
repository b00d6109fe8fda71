//! # LIBRIS CLI (`libris`)
//!
//! The `libris` binary is the interactive surface for the librarian
//! assistant. It provides one-shot commands for scripting and a chat REPL
//! that maintains a conversation session with document uploads.
//!
//! ## Usage
//!
//! ```bash
//! libris [--config ./config/libris.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `libris chat` | Interactive session: chat, `/search`, `/process`, `/export`, `/stats`, `/reset` |
//! | `libris search "<query>"` | One-shot knowledge-base search |
//! | `libris process <file>` | Normalize a document and send it for bibliographic extraction |
//! | `libris process <file> --dry-run` | Print the normalized text without calling the model |
//!
//! ## Examples
//!
//! ```bash
//! # One-shot search
//! libris search "ancient Greek ethics"
//!
//! # Process a reading list
//! libris process syllabus.pdf
//!
//! # Inspect what a PDF normalizes to before sending it anywhere
//! libris process syllabus.pdf --dry-run
//!
//! # Interactive session
//! libris chat
//! ```
//!
//! The credential is read from `ANTHROPIC_API_KEY` (or `--api-key`); the
//! `--dry-run` path needs no credential at all.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use libris::config::{self, Config};
use libris::librarian::Librarian;
use libris::oracle::AnthropicOracle;
use libris::repl;

/// LIBRIS — a conversational librarian assistant for historical and
/// philosophical collections.
///
/// Documents (.pdf, .docx, .txt, .md, .csv) are normalized to plain text and
/// sent, with your queries, to a remote language model that performs the
/// bibliographic extraction, search, and export formatting.
#[derive(Parser)]
#[command(
    name = "libris",
    about = "LIBRIS — conversational document ingestion and bibliographic chat",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Missing file falls back to built-in defaults, so the flag is only
    /// needed to override the model, token ceiling, timeouts, or upload
    /// limits.
    #[arg(long, global = true, default_value = "./config/libris.toml")]
    config: PathBuf,

    /// API credential; overrides the ANTHROPIC_API_KEY environment variable.
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session.
    ///
    /// Plain lines are sent to the librarian; slash commands mirror the
    /// one-shot commands plus session management (`/stats`, `/reset`).
    Chat,

    /// Search the librarian's knowledge base.
    Search {
        /// The search query string.
        query: String,
    },

    /// Normalize a document and send it for bibliographic extraction.
    ///
    /// Recognized extensions: .pdf, .docx, .txt, .md, .csv. Anything else is
    /// refused before any oracle call.
    Process {
        /// Path to the document.
        file: PathBuf,

        /// Print the normalized text instead of calling the model.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        Config::default()
    };

    // Dry-run needs no credential.
    if let Commands::Process { ref file, dry_run: true } = cli.command {
        return repl::run_preview(&cfg, file);
    }

    let api_key = config::resolve_api_key(cli.api_key.clone())?;
    let oracle = AnthropicOracle::new(api_key, &cfg.oracle)?;
    let librarian = Librarian::new(Box::new(oracle), &cfg.oracle);

    match cli.command {
        Commands::Chat => {
            repl::run_chat(&librarian, &cfg).await?;
        }
        Commands::Search { query } => {
            repl::run_search(&librarian, &query).await?;
        }
        Commands::Process { file, .. } => {
            repl::run_process(&librarian, &cfg, &file).await?;
        }
    }

    Ok(())
}
