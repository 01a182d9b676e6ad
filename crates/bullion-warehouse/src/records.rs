//! Plain row types exchanged with the warehouse.
//!
//! Timestamps are `YYYY-MM-DD HH:MM:SS` strings in UTC.

use serde::Serialize;

/// A cached OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBarRecord {
    /// Interval label (e.g. "15m").
    pub interval: String,
    /// Interval-aligned bar timestamp.
    pub ts: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// When the bar was written to the cache.
    pub cached_at: String,
}

/// A deduplicated news item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsRecord {
    /// Hex-encoded content fingerprint, unique across the store.
    pub fingerprint: String,
    pub title: String,
    pub summary: String,
    pub source_symbol: String,
    pub publisher: String,
    pub published_at: String,
    pub link: Option<String>,
    /// `None` when enrichment was disabled or failed.
    pub sentiment_score: Option<f64>,
    pub category: Option<String>,
    pub keywords: Vec<String>,
    pub fetched_at: String,
}

/// One provider fetch attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchAuditRecord {
    /// `price:<interval>` or `news:<symbol>`.
    pub target: String,
    pub range_start: Option<String>,
    pub range_end: Option<String>,
    pub fetched_count: u64,
    pub succeeded: bool,
    pub error_detail: Option<String>,
    pub occurred_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFetchAudit {
    pub id: i64,
    #[serde(flatten)]
    pub record: FetchAuditRecord,
}

/// One recommendation produced by the analysis layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRecord {
    pub generated_at: String,
    pub interval_used: String,
    pub hours_analyzed: u32,
    pub reference_price: Option<f64>,
    pub recommendation_text: String,
    pub input_data_point_count: u64,
    pub succeeded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecommendation {
    pub id: i64,
    #[serde(flatten)]
    pub record: RecommendationRecord,
}

/// Per-interval cache coverage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceCacheSummary {
    pub interval: String,
    pub bar_count: u64,
    pub first_ts: String,
    pub last_ts: String,
    pub latest_close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub item_count: u64,
    pub average_sentiment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublisherCount {
    pub publisher: String,
    pub item_count: u64,
}

/// Aggregate view of the cached news.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsSummary {
    pub total_items: u64,
    pub items_with_sentiment: u64,
    pub average_sentiment: Option<f64>,
    pub earliest_published: Option<String>,
    pub latest_published: Option<String>,
    pub categories: Vec<CategoryCount>,
    pub top_publishers: Vec<PublisherCount>,
}

/// Average sentiment of the items published on one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySentiment {
    /// `YYYY-MM-DD`.
    pub day: String,
    pub average_sentiment: f64,
    pub item_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySentiment {
    pub category: String,
    pub item_count: u64,
    pub average_sentiment: f64,
    pub max_sentiment: f64,
    pub min_sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublisherSentiment {
    pub publisher: String,
    pub item_count: u64,
    pub average_sentiment: f64,
    /// Population standard deviation.
    pub sentiment_std: f64,
}

/// Keywords of one scored item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredKeywords {
    pub keywords: Vec<String>,
    pub sentiment_score: f64,
}

pub(crate) fn count_from_sql(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}
