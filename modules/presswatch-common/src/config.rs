use std::env;
use std::time::Duration;

use tracing::info;

/// Application configuration loaded from environment variables.
///
/// Every field has a default so a bare `presswatch-scout` invocation works
/// against a local ingest endpoint and a local Chromium.
#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_url: String,

    // Ingest boundary
    pub ingest_url: String,

    // Rendering capability
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub user_agent: String,

    // Sentiment classifier capability
    pub sentiment_url: Option<String>,

    // Navigation timeouts. Article pages are less predictable than search
    // pages, so the two are configured independently.
    pub search_timeout: Duration,
    pub article_timeout: Duration,

    // Collection volume and pacing
    pub max_articles_per_keyword: usize,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,

    // Where to dump raw HTML when no extraction strategy matches.
    pub debug_snapshot_path: Option<String>,
}

impl Config {
    /// Load the full scout configuration.
    pub fn scout_from_env() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", "sqlite:presswatch.db"),
            ingest_url: env_or("INGEST_URL", "http://localhost:8000/ingest"),
            browserless_url: env::var("BROWSERLESS_URL").ok(),
            browserless_token: env::var("BROWSERLESS_TOKEN").ok(),
            user_agent: env_or("USER_AGENT", DEFAULT_USER_AGENT),
            sentiment_url: env::var("SENTIMENT_URL").ok(),
            search_timeout: Duration::from_millis(env_num("SEARCH_TIMEOUT_MS", 60_000)),
            article_timeout: Duration::from_millis(env_num("ARTICLE_TIMEOUT_MS", 45_000)),
            max_articles_per_keyword: env_num("MAX_ARTICLES_PER_KEYWORD", 10) as usize,
            delay_min_ms: env_num("DELAY_MIN_MS", 3_000),
            delay_max_ms: env_num("DELAY_MAX_MS", 7_000),
            debug_snapshot_path: env::var("DEBUG_SNAPSHOT_PATH").ok(),
        }
    }

    /// Load the configuration the ingestion side needs (storage + classifier).
    pub fn ingest_from_env() -> Self {
        let mut config = Self::scout_from_env();
        config.browserless_url = None;
        config.browserless_token = None;
        config
    }

    /// Log the effective configuration without leaking secrets.
    pub fn log_redacted(&self) {
        info!(
            database_url = self.database_url.as_str(),
            ingest_url = self.ingest_url.as_str(),
            browserless = self.browserless_url.is_some(),
            sentiment_endpoint = self.sentiment_url.is_some(),
            search_timeout_ms = self.search_timeout.as_millis() as u64,
            article_timeout_ms = self.article_timeout.as_millis() as u64,
            max_articles_per_keyword = self.max_articles_per_keyword,
            delay_ms = format!("{}..{}", self.delay_min_ms, self.delay_max_ms).as_str(),
            "Configuration loaded"
        );
    }
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_num(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
