//! Client side of the ingestion boundary.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use presswatch_common::Submission;

/// Where the orchestrator forwards finished records. The HTTP client below
/// is the production impl; tests substitute an in-memory sink.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn submit(&self, submission: &Submission) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Ingest API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// Posts one submission per call to the ingest endpoint. Fire-and-forget:
/// the orchestrator logs a failed submission and drops the record; there
/// is no retry or redelivery.
pub struct IngestClient {
    client: reqwest::Client,
    endpoint: String,
}

impl IngestClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: endpoint.to_string(),
        }
    }

    async fn post(&self, submission: &Submission) -> Result<(), IngestError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(submission)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(IngestError::Api {
                status: status.as_u16(),
                message,
            });
        }

        info!(
            platform = submission.platform.as_str(),
            url = submission.url.as_str(),
            "Record submitted"
        );
        Ok(())
    }
}

#[async_trait]
impl RecordSink for IngestClient {
    async fn submit(&self, submission: &Submission) -> Result<()> {
        self.post(submission).await.map_err(Into::into)
    }
}
