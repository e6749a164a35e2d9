pub mod article;
pub mod collector;
pub mod dates;
pub mod ingest_client;
pub mod renderer;
pub mod strategies;
pub mod urls;

pub use article::{ArticleContent, ArticleFetcher};
pub use collector::{Collector, RunStats};
pub use ingest_client::{IngestClient, RecordSink};
pub use renderer::{BrowserlessRenderer, ChromeRenderer, PageRenderer};
pub use strategies::{default_strategies, run_chain, Candidate, Strategy};
