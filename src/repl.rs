//! Interactive surface: the chat REPL and the one-shot command runners.
//!
//! Status and prompts go to **stderr** (gated on it being a TTY) so stdout
//! carries only the assistant's replies and stays parseable for scripts.
//! The REPL owns the session lifecycle: one session per `libris chat` run,
//! cleared by `/reset`, dropped on exit.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;

use crate::config::{Config, API_KEY_ENV};
use crate::document::UploadedDocument;
use crate::librarian::{ExportFormat, Librarian, ProcessError};
use crate::normalize::{normalize, NormalizeError};
use crate::oracle::OracleError;
use crate::session::Session;

/// Read a file into an upload, enforcing the configured size bound.
pub fn load_document(path: &Path, max_bytes: u64) -> Result<UploadedDocument> {
    let doc = UploadedDocument::from_path(path)?;
    if doc.bytes.len() as u64 > max_bytes {
        anyhow::bail!(
            "{} is {} bytes, over the {} byte upload limit (raise upload.max_bytes to allow it)",
            doc.name,
            doc.bytes.len(),
            max_bytes
        );
    }
    Ok(doc)
}

/// One-shot knowledge-base search over a fresh session.
pub async fn run_search(librarian: &Librarian, query: &str) -> Result<()> {
    let mut session = Session::new();
    print_reply(librarian.search(&mut session, query).await);
    Ok(())
}

/// One-shot document processing over a fresh session.
pub async fn run_process(librarian: &Librarian, config: &Config, path: &Path) -> Result<()> {
    let doc = load_document(path, config.upload.max_bytes)?;
    match librarian.process_document(&mut Session::new(), &doc).await {
        Ok(reply) => {
            println!("{}", reply);
            if atty::is(atty::Stream::Stderr) {
                eprintln!("processed {} ({})", doc.name, doc.media_type.label());
            }
        }
        Err(e) => print_process_error(&e),
    }
    Ok(())
}

/// Normalize a document and print the extracted text without calling the
/// oracle. Long content is truncated to the configured preview length.
pub fn run_preview(config: &Config, path: &Path) -> Result<()> {
    let doc = load_document(path, config.upload.max_bytes)?;
    match normalize(&doc) {
        Ok(content) => {
            let limit = config.upload.preview_chars;
            if content.chars().count() > limit {
                let shown: String = content.chars().take(limit).collect();
                println!("{}", shown);
                println!(
                    "\n... ({} more characters)",
                    content.chars().count() - limit
                );
            } else {
                println!("{}", content);
            }
        }
        Err(e) => print_normalize_error(&e),
    }
    Ok(())
}

/// Interactive chat loop over one session.
pub async fn run_chat(librarian: &Librarian, config: &Config) -> Result<()> {
    let mut session = Session::new();
    let tty = atty::is(atty::Stream::Stderr);

    if tty {
        eprintln!("libris chat — model {}", librarian.model_name());
        eprintln!("type a message, or /help for commands");
    }

    let stdin = io::stdin();
    loop {
        if tty {
            eprint!("> ");
            io::stderr().flush()?;
        }
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix('/') {
            let (cmd, arg) = split_command(rest);
            match cmd {
                "quit" | "exit" => break,
                "help" => print_help(),
                "reset" => {
                    session.reset();
                    eprintln!("session reset");
                }
                "stats" => print_stats(&session),
                "search" => {
                    if arg.is_empty() {
                        eprintln!("usage: /search <query>");
                        continue;
                    }
                    thinking(tty);
                    print_reply(librarian.search(&mut session, arg).await);
                }
                "process" => {
                    if arg.is_empty() {
                        eprintln!("usage: /process <file>");
                        continue;
                    }
                    match load_document(Path::new(arg), config.upload.max_bytes) {
                        Ok(doc) => {
                            thinking(tty);
                            match librarian.process_document(&mut session, &doc).await {
                                Ok(reply) => println!("{}", reply),
                                Err(e) => print_process_error(&e),
                            }
                        }
                        Err(e) => eprintln!("error: {:#}", e),
                    }
                }
                "export" => match arg.parse::<ExportFormat>() {
                    Ok(format) => {
                        thinking(tty);
                        print_reply(librarian.export(&mut session, format).await);
                    }
                    Err(e) => eprintln!("error: {}", e),
                },
                other => {
                    eprintln!("unknown command: /{} (/help lists commands)", other);
                }
            }
            continue;
        }

        thinking(tty);
        print_reply(librarian.chat(&mut session, line).await);
    }

    Ok(())
}

fn split_command(rest: &str) -> (&str, &str) {
    match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    }
}

fn thinking(tty: bool) {
    if tty {
        eprintln!("thinking...");
    }
}

fn print_reply(result: std::result::Result<String, OracleError>) {
    match result {
        Ok(reply) => println!("{}", reply),
        Err(e) => {
            eprintln!("error: {}", e);
            if e == OracleError::Authentication {
                eprintln!("check the {} credential and try again", API_KEY_ENV);
            }
        }
    }
}

fn print_process_error(err: &ProcessError) {
    match err {
        ProcessError::Normalize(e) => print_normalize_error(e),
        ProcessError::Oracle(e) => {
            eprintln!("error: {}", e);
        }
    }
}

fn print_normalize_error(err: &NormalizeError) {
    eprintln!("warning: {}", err);
    if matches!(err, NormalizeError::Empty(_)) {
        eprintln!("tip: for image-based PDFs, run an OCR tool first and upload the text output");
    }
}

fn print_stats(session: &Session) {
    println!("session");
    println!("  documents processed: {}", session.documents().len());
    println!("  queries made: {}", session.exchanges());
    for record in session.documents() {
        println!(
            "  - {} ({}, {})",
            record.filename,
            record.media_type.label(),
            record.processed_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
}

fn print_help() {
    println!("commands");
    println!("  /search <query>   search the knowledge base");
    println!("  /process <file>   upload a document (.pdf .docx .txt .md .csv)");
    println!("  /export <format>  export last results (bibtex, csv, json, text)");
    println!("  /stats            session counters and processed documents");
    println!("  /reset            clear the conversation and document list");
    println!("  /quit             leave the chat");
    println!("anything else is sent to the librarian as a chat message");
}
