//! OpenAI client construction.

use crate::error::{RagError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Environment variable for routing requests through an OpenAI-compatible gateway.
pub const API_BASE_ENV: &str = "OPENAI_API_BASE";

/// Create an OpenAI client with an optional API base override and a custom timeout.
///
/// When `api_base` is `None`, `OPENAI_API_BASE` is consulted before falling back to
/// the public endpoint. The API key is always read from `OPENAI_API_KEY`.
pub fn create_client_with(
    api_base: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::default();
    if let Some(base) = resolve_api_base(api_base) {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Pick the API base: explicit setting first, then the environment.
fn resolve_api_base(configured: Option<&str>) -> Option<String> {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var(API_BASE_ENV).ok())
        .filter(|base| !base.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_base_wins() {
        let base = resolve_api_base(Some("https://gateway.example/v1"));
        assert_eq!(base.as_deref(), Some("https://gateway.example/v1"));
    }

    #[test]
    fn test_blank_base_ignored() {
        assert!(resolve_api_base(Some("  ")).is_none());
    }
}
