use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::feeds::{self, Article, Category, FeedLoader};
use crate::llm::summarizer::{self, SummaryCache, SummaryOutcome};
use crate::llm::LlmProvider;
use crate::retry::BackoffPolicy;

/// One rendered card: the article plus its summary outcome.
/// `summary` is `None` when summarization is disabled (no credential).
#[derive(Debug, Clone)]
pub struct BriefItem {
    pub article: Article,
    pub summary: Option<SummaryOutcome>,
}

/// Request-scoped pipeline state: feed loader, optional LLM provider and the
/// two TTL caches. Built once from `Config`, shared across interactions.
pub struct Briefing {
    loader: FeedLoader,
    provider: Option<Arc<dyn LlmProvider>>,
    feed_cache: TtlCache<String, Vec<Article>>,
    summary_cache: SummaryCache,
    feed_ttl: Duration,
    summary_ttl: Duration,
    policy: BackoffPolicy,
}

impl Briefing {
    pub fn new(config: &common::Config, provider: Option<Arc<dyn LlmProvider>>) -> Result<Self> {
        let loader = FeedLoader::new(
            Duration::from_secs(config.feeds.fetch_timeout_seconds),
            &config.feeds.user_agent,
            config.feeds.max_articles,
        )
        .context("failed to build feed loader")?;

        let policy = BackoffPolicy::default()
            .with_max_attempts(config.llm.as_ref().and_then(|l| l.max_retries).unwrap_or(3));

        Ok(Self {
            loader,
            provider,
            feed_cache: TtlCache::new(),
            summary_cache: SummaryCache::new(),
            feed_ttl: Duration::from_secs(config.cache.feed_ttl_seconds),
            summary_ttl: Duration::from_secs(config.cache.summary_ttl_seconds),
            policy,
        })
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Build the briefing for a category (or the general fallback feed).
    pub async fn run(&self, category: Option<Category>) -> Vec<BriefItem> {
        let label = category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "Top stories".to_string());
        self.run_url(&label, feeds::feed_url(category)).await
    }

    /// Same as `run`, with the source URL given explicitly. `cache_key` is
    /// the feed-cache key (the category label in normal operation).
    pub async fn run_url(&self, cache_key: &str, url: &str) -> Vec<BriefItem> {
        let articles = match self
            .feed_cache
            .get_or_compute(cache_key.to_string(), self.feed_ttl, || {
                self.loader.load(url)
            })
            .await
        {
            Ok(articles) => articles,
            Err(e) => {
                // Fail-soft: a broken feed renders as an empty briefing
                warn!("feed fetch failed for '{}': {}", cache_key, e);
                Vec::new()
            }
        };

        info!("briefing '{}': {} articles", cache_key, articles.len());

        let mut items = Vec::with_capacity(articles.len());
        for article in articles {
            let summary = match self.provider.as_deref() {
                Some(provider) => Some(
                    summarizer::summarize(
                        provider,
                        &self.summary_cache,
                        self.summary_ttl,
                        self.policy,
                        &article.summary_input(),
                    )
                    .await,
                ),
                None => None,
            };
            items.push(BriefItem { article, summary });
        }
        items
    }
}
