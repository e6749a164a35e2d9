//! The rendering capability: navigate a URL with a timeout and return the
//! rendered DOM. The pipeline depends only on this trait, not on any
//! specific browser-automation product.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Semaphore;
use tracing::{info, warn};

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Navigate to `url` and return the rendered DOM as HTML. The timeout
    /// covers the whole navigation; the caller picks it per page class
    /// (search pages vs article pages).
    async fn render(&self, url: &str, timeout: Duration) -> Result<String>;
    fn name(&self) -> &str;
}

// --- Headless Chromium renderer ---

/// Max concurrent Chromium processes. Each instance is heavy (~100MB+ RSS,
/// multiple child processes); container PID/memory limits bite fast.
const MAX_CONCURRENT_CHROME: usize = 2;

/// Max retry attempts for transient Chromium failures (e.g. "Cannot fork").
const CHROME_MAX_ATTEMPTS: u32 = 3;
/// Base backoff for Chromium retries. Actual delay is base * 3^attempt + jitter.
const CHROME_RETRY_BASE: Duration = Duration::from_secs(3);

/// Renders pages with headless Chromium `--dump-dom`. Every navigation
/// gets a throwaway profile directory that is removed on drop, so page
/// resources are released on success and failure alike.
pub struct ChromeRenderer {
    semaphore: Semaphore,
    chrome_bin: String,
    user_agent: String,
}

impl ChromeRenderer {
    /// Probes the browser binary once; failing to launch the rendering
    /// capability is the one fatal startup error of a collection run.
    pub fn new(user_agent: &str) -> Result<Self> {
        let chrome_bin = std::env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string());

        let probe = std::process::Command::new(&chrome_bin)
            .arg("--version")
            .output()
            .with_context(|| format!("Cannot launch browser binary '{chrome_bin}'"))?;
        if !probe.status.success() {
            anyhow::bail!("Browser binary '{chrome_bin}' failed its version probe");
        }

        info!(
            chrome_bin = chrome_bin.as_str(),
            max_concurrent = MAX_CONCURRENT_CHROME,
            "Using ChromeRenderer"
        );
        Ok(Self {
            semaphore: Semaphore::new(MAX_CONCURRENT_CHROME),
            chrome_bin,
            user_agent: user_agent.to_string(),
        })
    }

    /// Launch Chromium and return raw DOM bytes. Retries transient
    /// fork/launch failures and timeouts with exponential backoff plus
    /// random jitter (0-1s).
    async fn run_chrome(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let parsed = url::Url::parse(url).context("Invalid URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("Only http/https URLs are allowed, got: {}", parsed.scheme());
        }

        for attempt in 0..CHROME_MAX_ATTEMPTS {
            let tmp_dir = tempfile::tempdir().context("Failed to create temp profile dir")?;

            let result = tokio::time::timeout(
                timeout,
                tokio::process::Command::new(&self.chrome_bin)
                    .args([
                        "--headless",
                        "--no-sandbox",
                        "--disable-gpu",
                        "--disable-dev-shm-usage",
                        &format!("--user-agent={}", self.user_agent),
                        &format!("--user-data-dir={}", tmp_dir.path().display()),
                        "--dump-dom",
                        url,
                    ])
                    .output(),
            )
            .await;

            match result {
                Ok(Ok(output)) => {
                    if output.status.success() {
                        return Ok(output.stdout);
                    }
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if is_transient(&stderr) && attempt + 1 < CHROME_MAX_ATTEMPTS {
                        self.backoff(url, attempt, "Browser cannot fork").await;
                        continue;
                    }
                    warn!(url, renderer = "chrome", stderr = %stderr, "Browser exited with error");
                    return Ok(Vec::new());
                }
                Ok(Err(e)) => {
                    if is_transient(&e.to_string()) && attempt + 1 < CHROME_MAX_ATTEMPTS {
                        self.backoff(url, attempt, "Browser launch failed").await;
                        continue;
                    }
                    return Err(e).with_context(|| format!("Failed to run browser for {url}"));
                }
                Err(_) => {
                    if attempt + 1 < CHROME_MAX_ATTEMPTS {
                        self.backoff(url, attempt, "Navigation timed out").await;
                        continue;
                    }
                    anyhow::bail!("Navigation timed out after {}s for {url}", timeout.as_secs());
                }
            }
        }

        Ok(Vec::new())
    }

    async fn backoff(&self, url: &str, attempt: u32, reason: &str) {
        let backoff = CHROME_RETRY_BASE * 3u32.pow(attempt);
        let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
        warn!(
            url,
            attempt = attempt + 1,
            backoff_secs = backoff.as_secs(),
            "{reason}, retrying after backoff"
        );
        tokio::time::sleep(backoff + jitter).await;
    }
}

fn is_transient(message: &str) -> bool {
    message.contains("Cannot fork") || message.contains("Resource temporarily unavailable")
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| anyhow::anyhow!("Browser semaphore closed"))?;

        info!(url, renderer = "chrome", "Rendering page");

        let html = self.run_chrome(url, timeout).await?;
        if html.is_empty() {
            warn!(url, renderer = "chrome", "Empty DOM output");
            return Ok(String::new());
        }

        Ok(String::from_utf8_lossy(&html).into_owned())
    }

    fn name(&self) -> &str {
        "chrome"
    }
}

// --- Browserless renderer ---

/// Renders pages through a Browserless deployment's /content endpoint.
pub struct BrowserlessRenderer {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessRenderer {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        info!(base_url, "Using BrowserlessRenderer");
        Self {
            client: reqwest::Client::builder()
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }
}

#[async_trait]
impl PageRenderer for BrowserlessRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<String> {
        info!(url, renderer = "browserless", "Rendering page");

        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = serde_json::json!({
            "url": url,
            "gotoOptions": { "timeout": timeout.as_millis() as u64 },
        });

        let resp = self
            .client
            .post(&endpoint)
            .timeout(timeout + Duration::from_secs(5))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Browserless content request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("Browserless returned {status}: {message}");
        }

        let html = resp.text().await.context("Failed to read Browserless response")?;
        info!(url, renderer = "browserless", bytes = html.len(), "Page rendered");
        Ok(html)
    }

    fn name(&self) -> &str {
        "browserless"
    }
}
