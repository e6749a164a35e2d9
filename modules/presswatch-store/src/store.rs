use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use presswatch_common::{
    classify, MediaType, Record, Sentiment, Submission, Topic, ValidationState,
};

/// Column list shared by every Record-shaped query. The table carries extra
/// enrichment columns the pipeline never reads back.
const RECORD_COLUMNS: &str =
    "id, discovered_at, platform, author, body, media_type, sentiment, url, topic, published_at, state";

/// SQLite-backed record store.
///
/// Each insert is one implicit transaction, so concurrent collection runs
/// sharing the same database file get per-record atomicity without any
/// cross-run coordination.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to open database")?;

        Ok(Self { pool })
    }

    /// In-memory database for tests and local tooling. Pinned to a single
    /// connection: a larger pool would silently give each connection its
    /// own empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Idempotent schema setup. Topic is a first-class indexed column so
    /// every read path can filter on it.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                discovered_at TEXT NOT NULL,
                platform TEXT NOT NULL,
                author TEXT NOT NULL,
                body TEXT NOT NULL,
                media_type TEXT NOT NULL,
                sentiment TEXT NOT NULL,
                url TEXT NOT NULL DEFAULT '',
                topic TEXT NOT NULL,
                published_at TEXT,
                state TEXT NOT NULL DEFAULT 'pending',
                summary TEXT,
                audience TEXT,
                recommended_action TEXT,
                priority TEXT,
                observation TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for ddl in [
            "CREATE INDEX IF NOT EXISTS idx_records_discovered_at ON records(discovered_at DESC)",
            "CREATE INDEX IF NOT EXISTS idx_records_platform ON records(platform)",
            "CREATE INDEX IF NOT EXISTS idx_records_sentiment ON records(sentiment)",
            "CREATE INDEX IF NOT EXISTS idx_records_topic ON records(topic)",
        ] {
            sqlx::query(ddl).execute(&self.pool).await?;
        }

        info!("Record store schema ready");
        Ok(())
    }

    /// Insert one record. Assigns the discovery timestamp and the pending
    /// review state; computes the topic from body + author when the
    /// submission does not carry one.
    pub async fn insert_record(&self, submission: &Submission) -> Result<Record> {
        let discovered_at = Utc::now();
        let sentiment = submission.sentiment.unwrap_or(Sentiment::Neutral);
        let topic = submission.topic.unwrap_or_else(|| {
            classify(&format!("{} {}", submission.body, submission.author))
        });

        let record = sqlx::query_as::<_, Record>(&format!(
            r#"
            INSERT INTO records
                (discovered_at, platform, author, body, media_type, sentiment, url,
                 topic, published_at, state,
                 summary, audience, recommended_action, priority, observation)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(discovered_at)
        .bind(&submission.platform)
        .bind(&submission.author)
        .bind(&submission.body)
        .bind(submission.media_type)
        .bind(sentiment)
        .bind(&submission.url)
        .bind(topic)
        .bind(submission.published_at)
        .bind(ValidationState::Pending)
        .bind(&submission.summary)
        .bind(&submission.audience)
        .bind(&submission.recommended_action)
        .bind(&submission.priority)
        .bind(&submission.observation)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert record")?;

        info!(
            id = record.id,
            platform = record.platform.as_str(),
            topic = record.topic.label(),
            "Record inserted"
        );
        Ok(record)
    }

    pub async fn get_record(&self, id: i64) -> Result<Option<Record>> {
        sqlx::query_as::<_, Record>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Recent records, newest discovery first, paginated for the dashboard.
    pub async fn list_records(&self, limit: i64, offset: i64) -> Result<Vec<Record>> {
        sqlx::query_as::<_, Record>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records ORDER BY discovered_at DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// The first `n` records of every platform, ranked by publication
    /// recency (discovery recency when no publication date is known).
    ///
    /// Partitioning per platform is what keeps a high-volume source from
    /// crowding low-volume ones out of a bounded listing.
    pub async fn top_per_platform(&self, n: i64, topic: Option<Topic>) -> Result<Vec<Record>> {
        sqlx::query_as::<_, Record>(&format!(
            r#"
            SELECT {RECORD_COLUMNS} FROM (
                SELECT *, ROW_NUMBER() OVER (
                    PARTITION BY platform
                    ORDER BY COALESCE(published_at, discovered_at) DESC
                ) AS platform_rank
                FROM records
                WHERE (?1 IS NULL OR topic = ?1)
            )
            WHERE platform_rank <= ?2
            ORDER BY platform, platform_rank
            "#
        ))
        .bind(topic)
        .bind(n)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Aggregate counts, optionally scoped to one topic.
    pub async fn statistics(&self, topic: Option<Topic>) -> Result<Statistics> {
        let sentiment_rows: Vec<(Sentiment, i64)> = sqlx::query_as(
            r#"
            SELECT sentiment, COUNT(*) FROM records
            WHERE (?1 IS NULL OR topic = ?1)
            GROUP BY sentiment
            "#,
        )
        .bind(topic)
        .fetch_all(&self.pool)
        .await?;

        let by_media_type: Vec<(MediaType, i64)> = sqlx::query_as(
            r#"
            SELECT media_type, COUNT(*) FROM records
            WHERE (?1 IS NULL OR topic = ?1)
            GROUP BY media_type
            "#,
        )
        .bind(topic)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = Statistics {
            total: by_media_type.iter().map(|(_, c)| c).sum(),
            positive: 0,
            negative: 0,
            neutral: 0,
            by_media_type,
        };
        for (sentiment, count) in sentiment_rows {
            match sentiment {
                Sentiment::Positive => stats.positive = count,
                Sentiment::Negative => stats.negative = count,
                Sentiment::Neutral => stats.neutral = count,
            }
        }
        Ok(stats)
    }

    /// Per-bucket, per-sentiment counts over a lookback window, oldest
    /// bucket first.
    pub async fn trend_counts(
        &self,
        bucket: TrendBucket,
        lookback_days: i64,
        topic: Option<Topic>,
    ) -> Result<Vec<TrendPoint>> {
        let cutoff = Utc::now() - Duration::days(lookback_days);

        sqlx::query_as::<_, TrendPoint>(
            r#"
            SELECT strftime(?1, discovered_at) AS bucket, sentiment, COUNT(*) AS count
            FROM records
            WHERE discovered_at >= ?2 AND (?3 IS NULL OR topic = ?3)
            GROUP BY bucket, sentiment
            ORDER BY bucket ASC
            "#,
        )
        .bind(bucket.strftime_format())
        .bind(cutoff)
        .bind(topic)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total: i64,
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
    pub by_media_type: Vec<(MediaType, i64)>,
}

/// Trend bucketing granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendBucket {
    Day,
    Week,
    Month,
    Year,
}

impl TrendBucket {
    fn strftime_format(&self) -> &'static str {
        match self {
            TrendBucket::Day => "%Y-%m-%d",
            TrendBucket::Week => "%Y-%W",
            TrendBucket::Month => "%Y-%m",
            TrendBucket::Year => "%Y",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendPoint {
    pub bucket: String,
    pub sentiment: Sentiment,
    pub count: i64,
}
