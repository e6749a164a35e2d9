//! End-to-end collection passes over fixture documents, with the renderer
//! and the ingest boundary mocked behind their traits: no browser, no
//! network, no database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use presswatch_common::{Config, Submission, Topic};
use presswatch_scout::collector::Collector;
use presswatch_scout::ingest_client::RecordSink;
use presswatch_scout::renderer::PageRenderer;

struct MockRenderer {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn render(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("navigation failed for {url}"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[derive(Default)]
struct MemorySink {
    submissions: Mutex<Vec<Submission>>,
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn submit(&self, submission: &Submission) -> Result<()> {
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl RecordSink for FailingSink {
    async fn submit(&self, _submission: &Submission) -> Result<()> {
        anyhow::bail!("ingest endpoint returned 503")
    }
}

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        ingest_url: "http://localhost:8000/ingest".into(),
        browserless_url: None,
        browserless_token: None,
        user_agent: "test-agent".into(),
        sentiment_url: None,
        search_timeout: Duration::from_secs(5),
        article_timeout: Duration::from_secs(5),
        max_articles_per_keyword: 10,
        delay_min_ms: 0,
        delay_max_ms: 0,
        debug_snapshot_path: None,
    }
}

const SEARCH_URL: &str = "https://www.google.com/search?q=test+keyword&tbm=nws";

const LONG_PARAGRAPH: &str = "The reporting paragraph runs well past both thresholds, carrying \
     the substance of the article in a single block of text that easily clears one hundred characters.";

fn search_page() -> String {
    r#"<html><body>
        <div class="Gx5Zad xpd">
            <a href="/url?q=https%3A%2F%2Fexample.com%2Fa&sa=U&ved=abc"></a>
            <h3>Test Title</h3>
            <div class="XR4uSe">Example Tribune</div>
            <span class="r0bn4c">3 hours ago</span>
        </div>
    </body></html>"#
        .to_string()
}

fn article_page() -> String {
    format!(
        r#"<html><body>
            <p>Byline.</p>
            <p>Photo credit.</p>
            <p>Share this.</p>
            <p>{LONG_PARAGRAPH}</p>
        </body></html>"#
    )
}

fn collector(pages: HashMap<String, String>, sink: Arc<dyn RecordSink>) -> Collector {
    Collector::new(
        Arc::new(MockRenderer { pages }),
        sink,
        test_config(),
        Arc::new(AtomicBool::new(false)),
    )
}

#[tokio::test]
async fn wrapped_link_is_canonicalized_and_deep_fetched() {
    let pages = HashMap::from([
        (SEARCH_URL.to_string(), search_page()),
        ("https://example.com/a".to_string(), article_page()),
    ]);
    let sink = Arc::new(MemorySink::default());
    let collector = collector(pages, sink.clone());

    let stats = collector
        .run_keywords(&["test keyword"], 10, None)
        .await
        .unwrap();

    assert_eq!(stats.submitted, 1);
    let submissions = sink.submissions.lock().unwrap();
    let record = &submissions[0];

    assert_eq!(record.url, "https://example.com/a");
    assert_eq!(record.platform, "Google News (Deep)");
    assert_eq!(record.author, "Example Tribune");
    // Body is title + the one substantial paragraph (with its trailing
    // separator), not the page-wide fallback.
    assert_eq!(record.body, format!("Test Title\n\n{LONG_PARAGRAPH}\n\n"));
    assert!(record.topic.is_none());

    // No dates in the article markup, so the snippet-relative time wins.
    let published = record.published_at.expect("snippet time should resolve");
    let delta = Utc::now() - chrono::Duration::hours(3) - published;
    assert!(delta.num_seconds().abs() < 10);
}

#[tokio::test]
async fn theme_pass_preassigns_the_topic() {
    let theme_search = "https://www.google.com/search?q=Niger+health&tbm=nws";
    let pages = HashMap::from([
        (theme_search.to_string(), search_page().replace("/url?q=https%3A%2F%2Fexample.com%2Fa&sa=U&ved=abc", "https://example.com/health")),
        ("https://example.com/health".to_string(), article_page()),
    ]);
    let sink = Arc::new(MemorySink::default());
    let collector = collector(pages, sink.clone());

    let stats = collector
        .run_keywords(&["Niger health"], 5, Some(Topic::Health))
        .await
        .unwrap();

    assert_eq!(stats.submitted, 1);
    assert_eq!(sink.submissions.lock().unwrap()[0].topic, Some(Topic::Health));
}

#[tokio::test]
async fn article_fetch_failure_skips_only_that_candidate() {
    let search = r#"<html><body>
        <div class="g"><a href="https://example.com/missing"></a><h3>Dead link</h3></div>
        <div class="g"><a href="https://example.com/alive"></a><h3>Live link</h3></div>
    </body></html>"#;
    let pages = HashMap::from([
        (SEARCH_URL.to_string(), search.to_string()),
        ("https://example.com/alive".to_string(), article_page()),
    ]);
    let sink = Arc::new(MemorySink::default());
    let collector = collector(pages, sink.clone());

    let stats = collector
        .run_keywords(&["test keyword"], 10, None)
        .await
        .unwrap();

    assert_eq!(stats.failed_articles, 1);
    assert_eq!(stats.submitted, 1);
    assert_eq!(sink.submissions.lock().unwrap()[0].url, "https://example.com/alive");
}

#[tokio::test]
async fn empty_article_body_falls_back_to_the_title() {
    let pages = HashMap::from([
        (SEARCH_URL.to_string(), search_page()),
        ("https://example.com/a".to_string(), "<html><body></body></html>".to_string()),
    ]);
    let sink = Arc::new(MemorySink::default());
    let collector = collector(pages, sink.clone());

    collector.run_keywords(&["test keyword"], 10, None).await.unwrap();

    assert_eq!(sink.submissions.lock().unwrap()[0].body, "Test Title");
}

#[tokio::test]
async fn navigation_failure_moves_on_to_the_next_keyword() {
    let second_search = "https://www.google.com/search?q=second&tbm=nws";
    let pages = HashMap::from([
        (second_search.to_string(), search_page()),
        ("https://example.com/a".to_string(), article_page()),
    ]);
    let sink = Arc::new(MemorySink::default());
    let collector = collector(pages, sink.clone());

    let stats = collector
        .run_keywords(&["test keyword", "second"], 10, None)
        .await
        .unwrap();

    assert_eq!(stats.failed_keywords, 1);
    assert_eq!(stats.submitted, 1);
}

#[tokio::test]
async fn submission_failure_drops_the_record_and_continues() {
    let pages = HashMap::from([
        (SEARCH_URL.to_string(), search_page()),
        ("https://example.com/a".to_string(), article_page()),
    ]);
    let collector = collector(pages, Arc::new(FailingSink));

    let stats = collector
        .run_keywords(&["test keyword"], 10, None)
        .await
        .unwrap();

    assert_eq!(stats.submitted, 0);
    assert_eq!(stats.dropped, 1);
}

#[tokio::test]
async fn shutdown_flag_ends_the_run_between_units() {
    let pages = HashMap::from([
        (SEARCH_URL.to_string(), search_page()),
        ("https://example.com/a".to_string(), article_page()),
    ]);
    let sink = Arc::new(MemorySink::default());
    let shutdown = Arc::new(AtomicBool::new(false));
    shutdown.store(true, Ordering::Relaxed);

    let collector = Collector::new(
        Arc::new(MockRenderer { pages }),
        sink.clone(),
        test_config(),
        shutdown,
    );

    let stats = collector
        .run_keywords(&["test keyword"], 10, None)
        .await
        .unwrap();

    assert_eq!(stats.keywords, 0);
    assert!(sink.submissions.lock().unwrap().is_empty());
}
