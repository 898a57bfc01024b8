use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::LlmSettings;

/// Where workflow checkpoints live.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointBackend {
    Memory,
    Postgres { database_url: String },
    Redis { redis_url: String },
}

/// Which relevance scorer the selector uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerBackend {
    Llm,
    Keyword,
}

/// Access granted to anyone holding a published document link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareAccess {
    Read,
    ReadWrite,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm: LlmSettings,
    pub checkpoint_backend: CheckpointBackend,
    pub relevance_scorer: ScorerBackend,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub public_base_url: String,
    pub share_access: ShareAccess,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_endpoint = require_env("S3_ENDPOINT")?;

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm: llm_settings_from_env()?,
            checkpoint_backend: checkpoint_backend_from_env()?,
            relevance_scorer: parse_scorer(&optional_env("RELEVANCE_SCORER", "llm"))?,
            s3_bucket: require_env("S3_BUCKET")?,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| s3_endpoint.clone()),
            s3_endpoint,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            share_access: parse_share_access(&optional_env("DOCUMENT_SHARE_ACCESS", "read_write"))?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn llm_settings_from_env() -> Result<LlmSettings> {
    let defaults = LlmSettings::default();
    Ok(LlmSettings {
        model: optional_env("LLM_MODEL", &defaults.model),
        temperature: optional_env("LLM_TEMPERATURE", "0.0")
            .parse::<f32>()
            .context("LLM_TEMPERATURE must be a number")?,
        max_tokens: optional_env("LLM_MAX_TOKENS", "4096")
            .parse::<u32>()
            .context("LLM_MAX_TOKENS must be a positive integer")?,
        timeout: Duration::from_secs(
            optional_env("LLM_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
        ),
    })
}

fn checkpoint_backend_from_env() -> Result<CheckpointBackend> {
    match optional_env("CHECKPOINT_BACKEND", "memory").as_str() {
        "memory" => Ok(CheckpointBackend::Memory),
        "postgres" => Ok(CheckpointBackend::Postgres {
            database_url: require_env("DATABASE_URL")?,
        }),
        "redis" => Ok(CheckpointBackend::Redis {
            redis_url: require_env("REDIS_URL")?,
        }),
        other => bail!("CHECKPOINT_BACKEND must be memory, postgres or redis (got '{other}')"),
    }
}

fn parse_scorer(value: &str) -> Result<ScorerBackend> {
    match value {
        "llm" => Ok(ScorerBackend::Llm),
        "keyword" => Ok(ScorerBackend::Keyword),
        other => bail!("RELEVANCE_SCORER must be llm or keyword (got '{other}')"),
    }
}

fn parse_share_access(value: &str) -> Result<ShareAccess> {
    match value {
        "read" => Ok(ShareAccess::Read),
        "read_write" => Ok(ShareAccess::ReadWrite),
        other => bail!("DOCUMENT_SHARE_ACCESS must be read or read_write (got '{other}')"),
    }
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scorer() {
        assert_eq!(parse_scorer("llm").unwrap(), ScorerBackend::Llm);
        assert_eq!(parse_scorer("keyword").unwrap(), ScorerBackend::Keyword);
        assert!(parse_scorer("random").is_err());
    }

    #[test]
    fn test_parse_share_access() {
        assert_eq!(parse_share_access("read").unwrap(), ShareAccess::Read);
        assert_eq!(parse_share_access("read_write").unwrap(), ShareAccess::ReadWrite);
        assert!(parse_share_access("write").is_err());
    }
}
