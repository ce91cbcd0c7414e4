use std::time::Duration;
use thiserror::Error;

use crate::retry::Retryable;

/// Core trait for LLM providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// List model identifiers available at the provider
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;

    /// Model identifier requests are issued against
    fn model(&self) -> &str;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
}

/// Typed generation errors. Rate limits are distinguished structurally (HTTP
/// 429) rather than by inspecting error text, and are the only transient
/// variant the retry controller acts on.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited by the model API")]
    RateLimited,
    #[error("model API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model request timed out after {0:?}")]
    Timeout(Duration),
    #[error("model response contained no choices")]
    EmptyResponse,
}

impl Retryable for LlmError {
    fn is_transient(&self) -> bool {
        matches!(self, LlmError::RateLimited)
    }
}

pub mod remote;
pub mod summarizer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limits_are_transient() {
        assert!(LlmError::RateLimited.is_transient());
        assert!(!LlmError::Api {
            status: 500,
            message: "server error".to_string()
        }
        .is_transient());
        assert!(!LlmError::EmptyResponse.is_transient());
        assert!(!LlmError::Timeout(Duration::from_secs(30)).is_transient());
    }
}
