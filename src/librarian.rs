//! Thin controller composing normalization and conversation.
//!
//! A [`Librarian`] bridges the hosting caller (CLI, REPL, tests) and the two
//! core components: it turns user intents — chat, search, document upload,
//! export — into conversation turns, and it is the one place that appends
//! document provenance to the session, always after a successful round-trip.
//! The CLI and the REPL delegate to the same methods, so both surfaces share
//! one code path.

use std::str::FromStr;

use crate::config::OracleConfig;
use crate::document::{DocumentRecord, UploadedDocument};
use crate::normalize::{normalize, NormalizeError};
use crate::oracle::{Oracle, OracleError};
use crate::prompts;
use crate::session::Session;

/// Export formats the last results can be requested in.
///
/// Formatting is entirely the oracle's responsibility; these only select the
/// request phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    BibTex,
    Csv,
    Json,
    PlainText,
}

impl ExportFormat {
    /// Phrase used in the export request turn.
    pub fn as_request_phrase(&self) -> &'static str {
        match self {
            ExportFormat::BibTex => "BibTeX",
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
            ExportFormat::PlainText => "plain text",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bibtex" => Ok(ExportFormat::BibTex),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "plain" | "plaintext" => Ok(ExportFormat::PlainText),
            other => anyhow::bail!(
                "unknown export format: '{}'. Available: bibtex, csv, json, text",
                other
            ),
        }
    }
}

/// Failure of a document-processing round-trip.
///
/// Normalization failures are returned before any oracle call is made, so
/// failure text is never fed to the model as if it were extracted content.
#[derive(Debug)]
pub enum ProcessError {
    Normalize(NormalizeError),
    Oracle(OracleError),
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessError::Normalize(e) => write!(f, "{}", e),
            ProcessError::Oracle(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProcessError {}

impl From<NormalizeError> for ProcessError {
    fn from(e: NormalizeError) -> Self {
        ProcessError::Normalize(e)
    }
}

impl From<OracleError> for ProcessError {
    fn from(e: OracleError) -> Self {
        ProcessError::Oracle(e)
    }
}

/// Controller over one oracle client, serving any number of sessions.
pub struct Librarian {
    oracle: Box<dyn Oracle>,
    system: String,
    max_tokens: u32,
}

impl Librarian {
    pub fn new(oracle: Box<dyn Oracle>, config: &OracleConfig) -> Self {
        Self {
            oracle,
            system: prompts::SYSTEM_PROMPT.to_string(),
            max_tokens: config.max_tokens,
        }
    }

    /// Model identifier of the backing oracle, for display.
    pub fn model_name(&self) -> &str {
        self.oracle.model_name()
    }

    /// One free-form chat exchange.
    pub async fn chat(
        &self,
        session: &mut Session,
        user_text: &str,
    ) -> Result<String, OracleError> {
        session
            .converse(self.oracle.as_ref(), &self.system, self.max_tokens, user_text)
            .await
    }

    /// Search the librarian's knowledge base.
    pub async fn search(
        &self,
        session: &mut Session,
        query: &str,
    ) -> Result<String, OracleError> {
        self.chat(session, &prompts::search_request(query)).await
    }

    /// Normalize a document and run the processing round-trip.
    ///
    /// On success a [`DocumentRecord`] is appended to the session's
    /// provenance; on any failure the session's provenance is untouched and
    /// the oracle is only reached if normalization succeeded.
    pub async fn process_document(
        &self,
        session: &mut Session,
        doc: &UploadedDocument,
    ) -> Result<String, ProcessError> {
        let content = normalize(doc)?;
        let message = prompts::document_request(&doc.name, &content);
        let reply = self.chat(session, &message).await?;
        session.record_document(DocumentRecord::stamp(doc));
        Ok(reply)
    }

    /// Ask for the last results in the given export format.
    pub async fn export(
        &self,
        session: &mut Session,
        format: ExportFormat,
    ) -> Result<String, OracleError> {
        self.chat(session, &prompts::export_request(format.as_request_phrase()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_format_parses_all_names() {
        assert_eq!("bibtex".parse::<ExportFormat>().unwrap(), ExportFormat::BibTex);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("text".parse::<ExportFormat>().unwrap(), ExportFormat::PlainText);
        assert_eq!("plain".parse::<ExportFormat>().unwrap(), ExportFormat::PlainText);
    }

    #[test]
    fn export_format_rejects_unknown_names() {
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn export_phrases_match_the_four_formats() {
        assert_eq!(ExportFormat::BibTex.as_request_phrase(), "BibTeX");
        assert_eq!(ExportFormat::Csv.as_request_phrase(), "CSV");
        assert_eq!(ExportFormat::Json.as_request_phrase(), "JSON");
        assert_eq!(ExportFormat::PlainText.as_request_phrase(), "plain text");
    }
}
