//! External text generation.
//!
//! The service talks to a language model only through the [`Generator`]
//! trait. Any failure is reported as a [`GeneratorError`] and the caller
//! falls back to the heuristics, so no error from this module ever reaches
//! an HTTP client.

mod chat;
pub mod prompt;

pub use chat::{choose_model, ChatClient, StreamDecoder};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::GeneratorConfig;

/// Errors that can occur while generating text.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by provider")]
    RateLimited,
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response stream: {0}")]
    MalformedStream(String),
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error("API key not found in ${0}")]
    MissingApiKey(String),
}

impl GeneratorError {
    /// Classify a transport error, separating timeouts.
    pub fn from_request(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeneratorError::Timeout
        } else {
            GeneratorError::Network(e)
        }
    }
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Produce a reply for `prompt`. One attempt; no retries.
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Build the configured generator, or `None` when AI answers are off.
///
/// A missing API key or a client that cannot be built disables the
/// collaborator with a warning instead of failing startup.
pub fn from_config(config: &GeneratorConfig) -> Option<Arc<dyn Generator>> {
    if !config.enabled {
        info!("generator disabled by configuration; using heuristics only");
        return None;
    }

    match ChatClient::from_config(config) {
        Ok(client) => {
            info!(endpoint = %config.endpoint, model = %config.model, "generator enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!(error = %e, "generator unavailable; using heuristics only");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_yields_none() {
        let config = GeneratorConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(from_config(&config).is_none());
    }

    #[test]
    fn test_missing_key_yields_none() {
        let config = GeneratorConfig {
            api_key_env: "CODEXPLAIN_TEST_NO_SUCH_KEY_41C".to_string(),
            ..Default::default()
        };
        assert!(from_config(&config).is_none());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GeneratorError::MissingApiKey("GROQ_API_KEY".to_string()).to_string(),
            "API key not found in $GROQ_API_KEY"
        );
        let err = GeneratorError::Status {
            status: 503,
            message: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "provider returned HTTP 503: busy");
    }
}
