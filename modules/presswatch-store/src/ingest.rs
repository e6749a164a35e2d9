use tracing::{info, warn};

use presswatch_common::{PressWatchError, Record, Sentiment, Submission};

use crate::sentiment::SentimentClassifier;
use crate::store::Store;

/// The server side of the ingestion boundary: accepts one record-shaped
/// submission per call, classifies, and inserts.
pub struct Ingestor {
    store: Store,
    classifier: Box<dyn SentimentClassifier>,
}

impl Ingestor {
    pub fn new(store: Store, classifier: Box<dyn SentimentClassifier>) -> Self {
        Self { store, classifier }
    }

    pub async fn process(&self, mut submission: Submission) -> Result<Record, PressWatchError> {
        if submission.platform.trim().is_empty() {
            return Err(PressWatchError::Validation("platform is required".into()));
        }
        if submission.body.trim().is_empty() {
            return Err(PressWatchError::Validation("body is required".into()));
        }

        // Precomputed tonality is respected; otherwise classify here. A
        // classify failure on an otherwise healthy endpoint degrades that
        // record to neutral instead of failing the submission.
        if submission.sentiment.is_none() {
            submission.sentiment = match self.classifier.classify(&submission.body).await {
                Ok(sentiment) => Some(sentiment),
                Err(e) => {
                    warn!(error = %e, "Sentiment classification failed, defaulting to neutral");
                    Some(Sentiment::Neutral)
                }
            };
        }

        let record = self
            .store
            .insert_record(&submission)
            .await
            .map_err(|e| PressWatchError::Database(e.to_string()))?;

        info!(
            id = record.id,
            platform = record.platform.as_str(),
            sentiment = %record.sentiment,
            "Submission ingested"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use presswatch_common::{MediaType, Topic, ValidationState};

    struct FixedClassifier(Sentiment);

    #[async_trait]
    impl SentimentClassifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<Sentiment> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl SentimentClassifier for FailingClassifier {
        async fn classify(&self, _text: &str) -> Result<Sentiment> {
            anyhow::bail!("model went away")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    async fn store() -> Store {
        let store = Store::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    fn submission() -> Submission {
        Submission::new(
            "Google News (Deep)",
            "Wire Desk",
            "The football championship final drew a record crowd",
            MediaType::Article,
            "https://example.com/final",
        )
    }

    #[tokio::test]
    async fn process_classifies_and_inserts() {
        let ingestor = Ingestor::new(store().await, Box::new(FixedClassifier(Sentiment::Positive)));
        let record = ingestor.process(submission()).await.unwrap();

        assert_eq!(record.sentiment, Sentiment::Positive);
        assert_eq!(record.topic, Topic::Sport);
        assert_eq!(record.state, ValidationState::Pending);
    }

    #[tokio::test]
    async fn classifier_failure_degrades_to_neutral() {
        let ingestor = Ingestor::new(store().await, Box::new(FailingClassifier));
        let record = ingestor.process(submission()).await.unwrap();
        assert_eq!(record.sentiment, Sentiment::Neutral);
    }

    #[tokio::test]
    async fn precomputed_sentiment_is_respected() {
        let ingestor = Ingestor::new(store().await, Box::new(FixedClassifier(Sentiment::Positive)));
        let mut sub = submission();
        sub.sentiment = Some(Sentiment::Negative);
        let record = ingestor.process(sub).await.unwrap();
        assert_eq!(record.sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let ingestor = Ingestor::new(store().await, Box::new(FixedClassifier(Sentiment::Neutral)));
        let mut sub = submission();
        sub.body = "  ".into();
        let err = ingestor.process(sub).await.unwrap_err();
        assert!(matches!(err, PressWatchError::Validation(_)));
    }
}
