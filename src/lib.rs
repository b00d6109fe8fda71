//! # LIBRIS
//!
//! A conversational librarian assistant: document ingestion and bibliographic
//! chat over a remote language model.
//!
//! Uploaded documents (PDF, Word, plain text, Markdown, CSV) are normalized
//! into plain text and forwarded, together with user queries, to an opaque
//! model oracle that performs the bibliographic extraction, search, and
//! export formatting. The crate owns the two parts with real data-handling
//! logic: the normalization pipeline and the conversation session.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌───────────┐
//! │  Uploads    │──▶│ Normalizer │──▶│ Librarian │
//! │ pdf/docx/.. │   │ plain text │   │ controller│
//! └────────────┘   └────────────┘   └─────┬─────┘
//!                                         │
//!                          ┌──────────────┤
//!                          ▼              ▼
//!                    ┌──────────┐   ┌──────────┐
//!                    │ Session  │──▶│  Oracle  │
//!                    │ history  │   │ (remote) │
//!                    └──────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and credential resolution |
//! | [`document`] | Upload boundary types and provenance records |
//! | [`normalize`] | Document-to-text normalization |
//! | [`session`] | Conversation history and the all-or-nothing exchange |
//! | [`oracle`] | Model oracle trait and the Anthropic-backed client |
//! | [`librarian`] | Thin controller: search, process, export |
//! | [`prompts`] | Fixed instruction text sent to the oracle |
//! | [`repl`] | Chat REPL and one-shot command runners |

pub mod config;
pub mod document;
pub mod librarian;
pub mod normalize;
pub mod oracle;
pub mod prompts;
pub mod repl;
pub mod session;
