//! The collection orchestrator: one pass per keyword over the search
//! surface, deep-fetching survivors and forwarding records to the ingest
//! boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use scraper::Html;
use tracing::{info, warn};
use url::Url;

use presswatch_common::{Config, MediaType, Submission, ThemeConfig, Topic, GLOBAL_KEYWORDS};

use crate::article::ArticleFetcher;
use crate::ingest_client::RecordSink;
use crate::renderer::PageRenderer;
use crate::strategies::{default_strategies, run_chain};

const PLATFORM_LABEL: &str = "Google News (Deep)";
/// Author labels are bounded the same way the dashboard column is.
const MAX_AUTHOR_CHARS: usize = 50;

#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub keywords: usize,
    pub submitted: usize,
    pub dropped: usize,
    pub failed_articles: usize,
    pub failed_keywords: usize,
    pub empty_keywords: usize,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} keywords: {} submitted, {} dropped, {} article failures, {} navigation failures, {} empty",
            self.keywords,
            self.submitted,
            self.dropped,
            self.failed_articles,
            self.failed_keywords,
            self.empty_keywords
        )
    }
}

pub struct Collector {
    renderer: Arc<dyn PageRenderer>,
    sink: Arc<dyn RecordSink>,
    config: Config,
    shutdown: Arc<AtomicBool>,
}

impl Collector {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        sink: Arc<dyn RecordSink>,
        config: Config,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            renderer,
            sink,
            config,
            shutdown,
        }
    }

    /// Admin-wide pass over the full watch-domain keyword list.
    pub async fn run_global(&self) -> Result<RunStats> {
        info!(keywords = GLOBAL_KEYWORDS.len(), "Starting global collection pass");
        self.run_keywords(GLOBAL_KEYWORDS, self.config.max_articles_per_keyword, None)
            .await
    }

    /// Narrowed pass over one theme's keyword subset, with the theme's own
    /// volume parameters and the topic preassigned on every record.
    pub async fn run_theme(&self, theme: &ThemeConfig) -> Result<RunStats> {
        info!(
            theme = theme.topic.label(),
            keywords = theme.keywords.len(),
            max_articles = theme.max_articles,
            priority = ?theme.priority,
            cadence = ?theme.cadence,
            "Starting theme collection pass"
        );
        self.run_keywords(theme.keywords, theme.max_articles, Some(theme.topic))
            .await
    }

    /// The shared pass body: both run modes reuse the same strategy chain
    /// and deep fetcher.
    pub async fn run_keywords(
        &self,
        keywords: &[&str],
        max_articles: usize,
        topic: Option<Topic>,
    ) -> Result<RunStats> {
        let fetcher = ArticleFetcher::new(self.renderer.clone(), self.config.article_timeout);
        let mut stats = RunStats::default();

        'keywords: for keyword in keywords {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Shutdown requested, ending run");
                break;
            }
            stats.keywords += 1;
            info!(keyword, "Searching");

            self.pause().await;

            let search_url = search_url(keyword);
            let html = match self
                .renderer
                .render(&search_url, self.config.search_timeout)
                .await
            {
                Ok(html) if !html.is_empty() => html,
                Ok(_) => {
                    warn!(keyword, "Empty search page");
                    stats.failed_keywords += 1;
                    continue;
                }
                Err(e) => {
                    warn!(keyword, error = %e, "Search navigation failed");
                    stats.failed_keywords += 1;
                    continue;
                }
            };

            let candidates = {
                let doc = Html::parse_document(&html);
                run_chain(&doc, default_strategies(), max_articles)
            };

            if candidates.is_empty() {
                warn!(keyword, "No candidates extracted");
                self.snapshot(keyword, &html);
                stats.empty_keywords += 1;
                continue;
            }
            info!(keyword, count = candidates.len(), "Candidates extracted");

            for candidate in candidates {
                if self.shutdown.load(Ordering::Relaxed) {
                    info!("Shutdown requested, abandoning remaining candidates");
                    break 'keywords;
                }

                self.pause().await;

                let content = match fetcher.fetch(&candidate, Utc::now()).await {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(url = candidate.url.as_str(), error = %e, "Article fetch failed");
                        stats.failed_articles += 1;
                        continue;
                    }
                };

                // Body falls back to the title when the page yielded
                // nothing usable; a record body is never empty.
                let body = if content.body.trim().is_empty() {
                    candidate.title.clone()
                } else {
                    format!("{}\n\n{}", candidate.title, content.body)
                };

                let mut submission = Submission::new(
                    PLATFORM_LABEL,
                    truncate_chars(candidate.source.trim(), MAX_AUTHOR_CHARS),
                    body,
                    MediaType::Article,
                    candidate.url.clone(),
                );
                submission.topic = topic;
                submission.published_at = content.published_at;

                match self.sink.submit(&submission).await {
                    Ok(()) => stats.submitted += 1,
                    Err(e) => {
                        warn!(url = candidate.url.as_str(), error = %e, "Submission failed, record dropped");
                        stats.dropped += 1;
                    }
                }
            }
        }

        info!(%stats, "Collection pass complete");
        Ok(stats)
    }

    /// Jittered politeness delay, applied before every navigation and
    /// between deep fetches.
    async fn pause(&self) {
        let min = self.config.delay_min_ms;
        let max = self.config.delay_max_ms.max(min);
        let delay = rand::rng().random_range(min..=max);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    /// Best-effort raw-document snapshot for offline diagnosis of markup
    /// changes. Never fatal.
    fn snapshot(&self, keyword: &str, html: &str) {
        let Some(ref path) = self.config.debug_snapshot_path else {
            return;
        };
        if let Err(e) = std::fs::write(path, html) {
            warn!(keyword, path = path.as_str(), error = %e, "Failed to write debug snapshot");
        } else {
            info!(keyword, path = path.as_str(), "Wrote debug snapshot");
        }
    }
}

fn search_url(keyword: &str) -> String {
    Url::parse_with_params(
        "https://www.google.com/search",
        &[("q", keyword), ("tbm", "nws")],
    )
    .expect("valid search URL")
    .to_string()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
