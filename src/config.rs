use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable holding the oracle credential.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            api_base: default_api_base(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_api_base() -> String {
    "https://api.anthropic.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_preview_chars() -> usize {
    2000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.oracle.max_tokens == 0 {
        anyhow::bail!("oracle.max_tokens must be > 0");
    }
    if config.oracle.model.trim().is_empty() {
        anyhow::bail!("oracle.model must not be empty");
    }
    if config.oracle.api_base.trim().is_empty() {
        anyhow::bail!("oracle.api_base must not be empty");
    }
    if config.upload.max_bytes == 0 {
        anyhow::bail!("upload.max_bytes must be > 0");
    }

    Ok(config)
}

/// Resolve the oracle credential: an explicit flag wins, then the environment.
///
/// Absence is a hard precondition failure with a user-readable message; no
/// oracle call can be attempted without it.
pub fn resolve_api_key(flag: Option<String>) -> Result<String> {
    let key = flag
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty());

    key.ok_or_else(|| {
        anyhow::anyhow!(
            "No API credential configured. Set the {} environment variable or pass --api-key.",
            API_KEY_ENV
        )
    })
}
