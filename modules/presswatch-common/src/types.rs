use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::topics::Topic;

// --- Enums ---

/// Tonality assigned by the sentiment-classifier collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Map a raw model label ("POSITIVE", "negative", "neutral", ...) onto
    /// the fixed tonality set. Unrecognized labels read as neutral.
    pub fn from_model_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("negative") {
            Sentiment::Negative
        } else if label.contains("positive") {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Neutral => write!(f, "Neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaType {
    Article,
    Post,
    Tweet,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Article => write!(f, "Article"),
            MediaType::Post => write!(f, "Post"),
            MediaType::Tweet => write!(f, "Tweet"),
        }
    }
}

/// Review lifecycle owned by the dashboard collaborator. The pipeline only
/// ever writes `Pending` and never reads this field back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "lowercase")]
pub enum ValidationState {
    Pending,
    Validated,
    Rejected,
}

// --- Record ---

/// One persisted unit of harvested content.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    /// Server-assigned at insert. Distinct from `published_at`.
    pub discovered_at: DateTime<Utc>,
    /// Source platform label, e.g. "Google News (Deep)", "Twitter/X".
    pub platform: String,
    pub author: String,
    pub body: String,
    pub media_type: MediaType,
    pub sentiment: Sentiment,
    /// Canonical URL. May be empty; never an indirection wrapper.
    pub url: String,
    pub topic: Topic,
    pub published_at: Option<DateTime<Utc>>,
    pub state: ValidationState,
}

// --- Submission ---

/// The ingestion-boundary payload: one record-shaped submission per call.
///
/// The enrichment fields (`summary` onward) exist for direct-submission
/// clients; the harvesting pipeline leaves them empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub platform: String,
    pub author: String,
    pub body: String,
    pub media_type: MediaType,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

impl Submission {
    pub fn new(
        platform: impl Into<String>,
        author: impl Into<String>,
        body: impl Into<String>,
        media_type: MediaType,
        url: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            author: author.into(),
            body: body.into(),
            media_type,
            url: url.into(),
            sentiment: None,
            topic: None,
            published_at: None,
            summary: None,
            audience: None,
            recommended_action: None,
            priority: None,
            observation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_label_mapping() {
        assert_eq!(Sentiment::from_model_label("POSITIVE"), Sentiment::Positive);
        assert_eq!(Sentiment::from_model_label("negative"), Sentiment::Negative);
        assert_eq!(Sentiment::from_model_label("5 stars"), Sentiment::Neutral);
    }

    #[test]
    fn submission_serializes_without_empty_optionals() {
        let s = Submission::new("Google News (Deep)", "Wire Desk", "body", MediaType::Article, "https://example.com/a");
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("sentiment").is_none());
        assert!(json.get("summary").is_none());
        assert_eq!(json["media_type"], "article");
    }
}
