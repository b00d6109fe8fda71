//! Model oracle abstraction and the Anthropic-backed client.
//!
//! Defines the [`Oracle`] trait — the single seam through which the session
//! reaches the remote language model — and [`AnthropicOracle`], the concrete
//! client over the Messages HTTP API. Substituting another provider means
//! implementing [`Oracle`] for its transport; the session logic never sees a
//! concrete client.
//!
//! # Failure model
//!
//! Every call resolves to one of three [`OracleError`] kinds so callers can
//! choose policy per kind (e.g. prompt for a new credential only on
//! [`OracleError::Authentication`]):
//!
//! | HTTP outcome | Error |
//! |--------------|-------|
//! | 401 / 403 | `Authentication` |
//! | 429 | `RateLimited` |
//! | other non-success, transport, malformed body | `Other` |
//!
//! No retries happen here: a failed call is surfaced immediately, and the
//! session guarantees a failed exchange is a no-op, so the caller may simply
//! issue the call again.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::OracleConfig;
use crate::session::Turn;

/// Version header required by the Messages API.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Oracle failure, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The service rejected the credential.
    Authentication,
    /// The service throttled the request.
    RateLimited,
    /// Network, service, or protocol failure.
    Other(String),
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Authentication => {
                write!(f, "authentication failed: the API key was rejected")
            }
            OracleError::RateLimited => {
                write!(f, "rate limited: too many requests, wait a moment and retry")
            }
            OracleError::Other(detail) => write!(f, "model request failed: {}", detail),
        }
    }
}

impl std::error::Error for OracleError {}

/// The external language model, treated as opaque.
///
/// One call per exchange: fixed system instructions, the full ordered turn
/// history, and a response-size ceiling in; assistant text or a tagged error
/// out.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Model identifier for display (e.g. `"claude-sonnet-4-5-20250929"`).
    fn model_name(&self) -> &str;

    /// Request a completion for the given turn history.
    async fn complete(
        &self,
        system: &str,
        turns: &[Turn],
        max_tokens: u32,
    ) -> Result<String, OracleError>;
}

/// Oracle client over the Anthropic Messages API.
///
/// Holds the API credential for the lifetime of the process; session resets
/// do not touch it.
pub struct AnthropicOracle {
    api_key: String,
    model: String,
    api_base: String,
    client: reqwest::Client,
}

impl AnthropicOracle {
    /// Build a client from a resolved credential and oracle configuration.
    pub fn new(api_key: String, config: &OracleConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            api_key,
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Oracle for AnthropicOracle {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        turns: &[Turn],
        max_tokens: u32,
    ) -> Result<String, OracleError> {
        let messages: Vec<Value> = turns
            .iter()
            .map(|t| {
                serde_json::json!({
                    "role": t.role.as_str(),
                    "content": t.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "system": system,
            "messages": messages,
        });

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Other(e.to_string()))?;

        let status = resp.status();
        match status.as_u16() {
            401 | 403 => return Err(OracleError::Authentication),
            429 => return Err(OracleError::RateLimited),
            _ if !status.is_success() => {
                let body_text = resp.text().await.unwrap_or_default();
                return Err(OracleError::Other(format!(
                    "API error {}: {}",
                    status, body_text
                )));
            }
            _ => {}
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| OracleError::Other(e.to_string()))?;
        parse_message_text(&json)
    }
}

/// Extract the assistant text from a Messages API response body.
///
/// Concatenates the `content[].text` blocks in order. A response with no text
/// block is a protocol failure, not an empty reply.
fn parse_message_text(json: &Value) -> Result<String, OracleError> {
    let blocks = json
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| OracleError::Other("invalid response: missing content array".to_string()))?;

    let mut out = String::new();
    for block in blocks {
        if block.get("type").and_then(|t| t.as_str()) == Some("text") {
            if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                out.push_str(text);
            }
        }
    }

    if out.is_empty() {
        return Err(OracleError::Other(
            "invalid response: no text content".to_string(),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_single_text_block() {
        let json = serde_json::json!({
            "content": [{ "type": "text", "text": "Here are your results." }]
        });
        assert_eq!(parse_message_text(&json).unwrap(), "Here are your results.");
    }

    #[test]
    fn parse_concatenates_text_blocks_in_order() {
        let json = serde_json::json!({
            "content": [
                { "type": "text", "text": "Part one. " },
                { "type": "tool_use", "id": "x", "name": "n", "input": {} },
                { "type": "text", "text": "Part two." }
            ]
        });
        assert_eq!(parse_message_text(&json).unwrap(), "Part one. Part two.");
    }

    #[test]
    fn parse_rejects_missing_content() {
        let json = serde_json::json!({ "id": "msg_123" });
        assert!(matches!(
            parse_message_text(&json),
            Err(OracleError::Other(_))
        ));
    }

    #[test]
    fn parse_rejects_contentless_reply() {
        let json = serde_json::json!({ "content": [] });
        assert!(matches!(
            parse_message_text(&json),
            Err(OracleError::Other(_))
        ));
    }

    #[test]
    fn error_kinds_render_distinct_messages() {
        let auth = OracleError::Authentication.to_string();
        let rate = OracleError::RateLimited.to_string();
        let other = OracleError::Other("boom".to_string()).to_string();
        assert_ne!(auth, rate);
        assert_ne!(rate, other);
        assert!(other.contains("boom"));
    }
}
