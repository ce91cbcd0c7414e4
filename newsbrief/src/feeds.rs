use chrono::{DateTime, Utc};
use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// News categories a briefing can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Category {
    Politics,
    Economy,
    Society,
    International,
    ItScience,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Politics,
        Category::Economy,
        Category::Society,
        Category::International,
        Category::ItScience,
    ];

    /// Google News topic feed for this category.
    pub fn feed_url(self) -> &'static str {
        match self {
            Category::Politics => "https://news.google.com/rss/topics/CAAqIQgKIhtDQkFTRGdvSUwyMHZNRFZ4ZERJU0FtdHZLQUFQAQ?hl=ko&gl=KR&ceid=KR%3Ako",
            Category::Economy => "https://news.google.com/rss/topics/CAAqIQgKIhtDQkFTRGdvSUwyMHZNR2PoWjJJU0FtdHZLQUFQAQ?hl=ko&gl=KR&ceid=KR%3Ako",
            Category::Society => "https://news.google.com/rss/topics/CAAqIQgKIhtDQkFTRGdvSUwyMHZNRmh6Y21JU0FtdHZLQUFQAQ?hl=ko&gl=KR&ceid=KR%3Ako",
            Category::International => "https://news.google.com/rss/topics/CAAqIQgKIhtDQkFTRGdvSUwyMHZNR5Z0WjJJU0FtdHZLQUFQAQ?hl=ko&gl=KR&ceid=KR%3Ako",
            Category::ItScience => "https://news.google.com/rss/topics/CAAqIQgKIhtDQkFTRGdvSUwyMHZNR1J4Y1hJU0FtdHZLQUFQAQ?hl=ko&gl=KR&ceid=KR%3Ako",
        }
    }

    /// Parse a menu selection typed by the user; matching is on the label,
    /// case-insensitive.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Politics => "Politics",
            Category::Economy => "Economy",
            Category::Society => "Society",
            Category::International => "International",
            Category::ItScience => "IT/Science",
        };
        f.write_str(label)
    }
}

/// Fallback feed used when no category is selected: general top stories.
pub const DEFAULT_FEED_URL: &str = "https://news.google.com/rss?hl=ko&gl=KR&ceid=KR:ko";

/// Resolve a (possibly absent) category to a source URL.
pub fn feed_url(category: Option<Category>) -> &'static str {
    category.map(Category::feed_url).unwrap_or(DEFAULT_FEED_URL)
}

/// One feed entry, trimmed down to what the briefing needs.
/// `published = None` means the feed carried no parseable publish date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub snippet: String,
}

impl Article {
    pub fn published_label(&self) -> String {
        match self.published {
            Some(date) => date.format("%Y-%m-%d %H:%M").to_string(),
            None => "unknown date".to_string(),
        }
    }

    /// The text handed to the summarizer: title plus snippet.
    pub fn summary_input(&self) -> String {
        if self.snippet.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.snippet)
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed fetch failed with status: {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to parse feed: {0}")]
    Parse(#[from] parser::ParseFeedError),
}

/// Fetches a category feed and maps its entries to `Article`s.
///
/// Single attempt, no retry; the caller treats any `FetchError` as
/// "no articles" rather than propagating it.
pub struct FeedLoader {
    client: Client,
    max_articles: usize,
}

impl FeedLoader {
    pub fn new(timeout: Duration, user_agent: &str, max_articles: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_articles,
        })
    }

    pub async fn load(&self, url: &str) -> Result<Vec<Article>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(bytes.as_ref())?;
        debug!("fetched feed '{}': {} entries", url, feed.entries.len());
        Ok(articles_from_feed(feed, self.max_articles))
    }
}

/// Map feed entries to `Article`s, preserving feed order and keeping at most
/// `max_articles`. Entries without a link are skipped.
fn articles_from_feed(feed: Feed, max_articles: usize) -> Vec<Article> {
    feed.entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.clone())
                .unwrap_or_default();
            // Use the first link as the URL
            let link = entry.links.first().map(|l| l.href.clone())?;

            let raw_snippet = entry
                .content
                .as_ref()
                .and_then(|c| c.body.clone())
                .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
                .unwrap_or_default();

            Some(Article {
                title,
                link,
                published: entry.published,
                snippet: clean_snippet(&raw_snippet),
            })
        })
        .take(max_articles)
        .collect()
}

/// Feed descriptions arrive as HTML; flatten to single-spaced plain text
/// before the text reaches a prompt or a card.
fn clean_snippet(raw: &str) -> String {
    let text = html2text::from_read(raw.as_bytes(), 80).unwrap_or_else(|_| raw.to_string());
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
