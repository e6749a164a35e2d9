pub mod ingest;
pub mod sentiment;
pub mod store;

pub use ingest::Ingestor;
pub use sentiment::{select_classifier, NeutralSentimentClassifier, SentimentClassifier};
pub use store::{Statistics, Store, TrendBucket, TrendPoint};
