use std::sync::Arc;

use newsbrief::briefing::Briefing;
use newsbrief::llm::remote::RemoteLlmProvider;
use newsbrief::llm::summarizer::SummaryOutcome;
use newsbrief::llm::LlmProvider;

const FEED_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>IT/Science</title>
    <link>https://news.example.com</link>
    <description>Science and technology stories</description>
    <item>
      <title>Probe reaches orbit</title>
      <link>https://news.example.com/probe</link>
      <pubDate>Wed, 06 Aug 2025 10:00:00 GMT</pubDate>
      <description>The probe entered orbit after a seven month cruise.</description>
    </item>
    <item>
      <title>Chip fab expands</title>
      <link>https://news.example.com/fab</link>
      <pubDate>Wed, 06 Aug 2025 09:00:00 GMT</pubDate>
      <description>A new production line doubles output.</description>
    </item>
    <item>
      <title>Battery breakthrough</title>
      <link>https://news.example.com/battery</link>
      <description>Researchers report a longer-lived cell.</description>
    </item>
  </channel>
</rss>"#;

const LLM_BODY: &str = r#"{
    "model": "gemini-2.0-flash",
    "choices": [{
        "message": {"role": "assistant", "content": "- a\n- b\n- c"},
        "finish_reason": "stop"
    }]
}"#;

fn test_config() -> common::Config {
    let mut config = common::Config::default();
    config.feeds.fetch_timeout_seconds = 5;
    config
}

fn provider_for(server: &mockito::ServerGuard) -> Arc<dyn LlmProvider> {
    Arc::new(RemoteLlmProvider::new(
        server.url(),
        "fake-api-key",
        "gemini-2.0-flash",
    ))
}

#[tokio::test]
async fn briefing_summarizes_each_article_in_feed_order() {
    let mut feed_server = mockito::Server::new_async().await;
    let mut llm_server = mockito::Server::new_async().await;

    let feed_mock = feed_server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(FEED_BODY)
        .create_async()
        .await;

    // One generation per article
    let llm_mock = llm_server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LLM_BODY)
        .expect(3)
        .create_async()
        .await;

    let briefing = Briefing::new(&test_config(), Some(provider_for(&llm_server)))
        .expect("build briefing");

    let items = briefing.run_url("IT/Science", &feed_server.url()).await;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].article.title, "Probe reaches orbit");
    assert_eq!(items[1].article.title, "Chip fab expands");
    assert_eq!(items[2].article.title, "Battery breakthrough");
    assert!(items[2].article.published.is_none());
    for item in &items {
        assert_eq!(
            item.summary,
            Some(SummaryOutcome::Success("- a\n- b\n- c".to_string()))
        );
    }

    feed_mock.assert_async().await;
    llm_mock.assert_async().await;
}

#[tokio::test]
async fn briefing_without_credential_skips_summaries_but_loads_feed() {
    let mut feed_server = mockito::Server::new_async().await;

    let feed_mock = feed_server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(FEED_BODY)
        .create_async()
        .await;

    let briefing = Briefing::new(&test_config(), None).expect("build briefing");
    assert!(!briefing.has_provider());

    let items = briefing.run_url("IT/Science", &feed_server.url()).await;

    assert_eq!(items.len(), 3);
    for item in &items {
        assert_eq!(item.summary, None);
    }

    feed_mock.assert_async().await;
}

#[tokio::test]
async fn broken_feed_renders_as_empty_briefing() {
    let mut feed_server = mockito::Server::new_async().await;

    let feed_mock = feed_server
        .mock("GET", "/")
        .with_status(500)
        .create_async()
        .await;

    let briefing = Briefing::new(&test_config(), None).expect("build briefing");

    let items = briefing.run_url("Politics", &feed_server.url()).await;

    assert!(items.is_empty());

    feed_mock.assert_async().await;
}

#[tokio::test]
async fn second_request_within_ttl_reuses_both_caches() {
    let mut feed_server = mockito::Server::new_async().await;
    let mut llm_server = mockito::Server::new_async().await;

    let feed_mock = feed_server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(FEED_BODY)
        .expect(1)
        .create_async()
        .await;

    let llm_mock = llm_server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LLM_BODY)
        .expect(3)
        .create_async()
        .await;

    let briefing = Briefing::new(&test_config(), Some(provider_for(&llm_server)))
        .expect("build briefing");

    let first = briefing.run_url("IT/Science", &feed_server.url()).await;
    let second = briefing.run_url("IT/Science", &feed_server.url()).await;

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);

    // One feed fetch and three generations total across both requests
    feed_mock.assert_async().await;
    llm_mock.assert_async().await;
}

#[tokio::test]
async fn persistent_rate_limit_surfaces_as_rate_limited_outcome() {
    let mut feed_server = mockito::Server::new_async().await;
    let mut llm_server = mockito::Server::new_async().await;

    let single_item_feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Politics</title>
    <link>https://news.example.com</link>
    <description>One story</description>
    <item>
      <title>Vote scheduled</title>
      <link>https://news.example.com/vote</link>
      <description>The vote is scheduled for Friday.</description>
    </item>
  </channel>
</rss>"#;

    let feed_mock = feed_server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(single_item_feed)
        .create_async()
        .await;

    // All three attempts hit the rate limit
    let llm_mock = llm_server
        .mock("POST", "/")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .expect(3)
        .create_async()
        .await;

    let briefing = Briefing::new(&test_config(), Some(provider_for(&llm_server)))
        .expect("build briefing");

    let items = briefing.run_url("Politics", &feed_server.url()).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].summary, Some(SummaryOutcome::RateLimited));

    feed_mock.assert_async().await;
    llm_mock.assert_async().await;
}
