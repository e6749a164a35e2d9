use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use presswatch_common::Sentiment;

/// Tonality input is capped before it reaches the model endpoint.
const CLASSIFY_INPUT_CHARS: usize = 512;

/// The sentiment-classification capability.
///
/// Two implementations exist: the remote model endpoint and a neutral
/// stand-in. Which one a process uses is decided once at startup by
/// [`select_classifier`], never per call.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment>;
    fn name(&self) -> &str;
}

// --- Remote model endpoint ---

pub struct RemoteSentimentClassifier {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: String,
}

impl RemoteSentimentClassifier {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// One startup probe against the endpoint.
    pub async fn health_check(&self) -> Result<()> {
        self.classify("health check").await.map(|_| ())
    }
}

#[async_trait]
impl SentimentClassifier for RemoteSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment> {
        let input: String = text.chars().take(CLASSIFY_INPUT_CHARS).collect();
        let body = serde_json::json!({ "text": input });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("Sentiment request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Sentiment endpoint returned {status}");
        }

        let parsed: ClassifyResponse = resp
            .json()
            .await
            .context("Failed to parse sentiment response")?;

        Ok(Sentiment::from_model_label(&parsed.label))
    }

    fn name(&self) -> &str {
        "remote"
    }
}

// --- Neutral stand-in ---

/// Used when no endpoint is configured or the startup probe fails: every
/// record reads as neutral and the run keeps going.
pub struct NeutralSentimentClassifier;

#[async_trait]
impl SentimentClassifier for NeutralSentimentClassifier {
    async fn classify(&self, _text: &str) -> Result<Sentiment> {
        Ok(Sentiment::Neutral)
    }

    fn name(&self) -> &str {
        "neutral"
    }
}

/// Pick the classifier implementation for this process.
pub async fn select_classifier(sentiment_url: Option<&str>) -> Box<dyn SentimentClassifier> {
    match sentiment_url {
        Some(url) => {
            let remote = RemoteSentimentClassifier::new(url);
            match remote.health_check().await {
                Ok(()) => {
                    info!(endpoint = url, "Sentiment classifier online");
                    Box::new(remote)
                }
                Err(e) => {
                    warn!(endpoint = url, error = %e, "Sentiment endpoint unavailable, degrading to neutral");
                    Box::new(NeutralSentimentClassifier)
                }
            }
        }
        None => {
            info!("No sentiment endpoint configured, using neutral classifier");
            Box::new(NeutralSentimentClassifier)
        }
    }
}
