// Summarizer module
use std::time::Duration;
use tracing::{debug, warn};

use super::{LlmError, LlmProvider, LlmRequest};
use crate::cache::TtlCache;
use crate::retry::{self, BackoffPolicy};

/// Outcome of summarizing one article, rendered as-is by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Success(String),
    RateLimited,
    Failed(String),
}

/// Cache of raw successful generations, keyed by normalized article text
/// plus model identifier.
pub type SummaryCache = TtlCache<String, String>;

const INSTRUCTIONS: &str = "You are a helpful news assistant.\n\
    Summarize the following news article title and snippet into exactly 3 bullet points.\n\
    Keep it concise and easy to understand.";

/// Deterministic prompt: fixed instructions, article text appended verbatim.
pub fn build_prompt(article_text: &str) -> String {
    format!("{}\n\nNews: {}", INSTRUCTIONS, article_text)
}

pub fn cache_key(article_text: &str, model: &str) -> String {
    let normalized = article_text.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{}:{}", model, normalized)
}

/// Summarize one article through the cache and the retry controller.
///
/// The cached unit is the raw generation text; classification into
/// `SummaryOutcome` happens outside the cache, so rate-limit and failure
/// outcomes are never memoized and a later request gets a fresh attempt.
pub async fn summarize<P: LlmProvider + ?Sized>(
    provider: &P,
    cache: &SummaryCache,
    ttl: Duration,
    policy: BackoffPolicy,
    article_text: &str,
) -> SummaryOutcome {
    let key = cache_key(article_text, provider.model());

    let raw = cache
        .get_or_compute(key, ttl, || async {
            let request = LlmRequest {
                prompt: build_prompt(article_text),
                max_tokens: None,
                temperature: Some(0.5),
                timeout_seconds: None,
            };
            retry::run(policy, || provider.generate(request.clone()))
                .await
                .map(|response| response.content)
        })
        .await;

    match raw {
        Ok(text) => {
            debug!("summary ready ({} chars)", text.len());
            SummaryOutcome::Success(text)
        }
        Err(LlmError::RateLimited) => {
            warn!("summarization rate limited after retries");
            SummaryOutcome::RateLimited
        }
        Err(e) => {
            warn!("summarization failed: {}", e);
            SummaryOutcome::Failed(e.to_string())
        }
    }
}
