//! Upload boundary types: uploaded documents and session provenance records.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Declared media type of an uploaded file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Word,
    PlainText,
    Markdown,
    Csv,
    Unsupported,
}

impl MediaType {
    /// Recognize a media type from a file name (case-insensitive extension).
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        match Path::new(&lower).extension().and_then(|e| e.to_str()) {
            Some("pdf") => MediaType::Pdf,
            Some("docx") => MediaType::Word,
            Some("txt") => MediaType::PlainText,
            Some("md") => MediaType::Markdown,
            Some("csv") => MediaType::Csv,
            _ => MediaType::Unsupported,
        }
    }

    /// Short label used in listings and provenance output.
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Pdf => "pdf",
            MediaType::Word => "docx",
            MediaType::PlainText => "txt",
            MediaType::Markdown => "md",
            MediaType::Csv => "csv",
            MediaType::Unsupported => "unsupported",
        }
    }

}

/// An uploaded file awaiting normalization. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Wrap a file received as name + raw bytes.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = MediaType::from_name(&name);
        Self {
            name,
            media_type,
            bytes,
        }
    }

    /// Read a file from disk into an upload.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(name, bytes))
    }
}

/// Provenance entry recorded after a successful document-processing round-trip.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub filename: String,
    pub processed_at: DateTime<Utc>,
    pub media_type: MediaType,
}

impl DocumentRecord {
    /// Stamp a record for a document processed now.
    pub fn stamp(doc: &UploadedDocument) -> Self {
        Self {
            filename: doc.name.clone(),
            processed_at: Utc::now(),
            media_type: doc.media_type,
        }
    }
}
