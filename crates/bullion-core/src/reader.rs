//! Read-only access for presentation layers and the analysis layer.

use bullion_warehouse::{NewsQuery, NewsSummary, PriceCacheSummary, Warehouse};

use crate::news::analysis::{CategoryAnalysis, KeywordAnalysis, PublisherAnalysis, SentimentTrend};
use crate::records::{audit_from_stored, bar_from_record, news_from_record};
use crate::{
    CachedBar, CoreError, FetchAuditEntry, Interval, NewsCategory, NewsItem, SentimentLabel,
    Symbol, TimeRange, UtcDateTime,
};

/// Publishers with fewer scored items are left out of the publisher analysis.
const MIN_PUBLISHER_ITEMS: u64 = 2;

/// News filters; every bound is optional and sentiment bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsFilter {
    pub category: Option<NewsCategory>,
    pub sentiment: Option<SentimentLabel>,
    pub min_sentiment: Option<f64>,
    pub max_sentiment: Option<f64>,
    pub source_symbol: Option<Symbol>,
    pub since: Option<UtcDateTime>,
    pub until: Option<UtcDateTime>,
    pub limit: usize,
}

impl Default for NewsFilter {
    fn default() -> Self {
        Self {
            category: None,
            sentiment: None,
            min_sentiment: None,
            max_sentiment: None,
            source_symbol: None,
            since: None,
            until: None,
            limit: 50,
        }
    }
}

impl NewsFilter {
    /// Items published within the last `days` days.
    pub fn recent_days(days: u32) -> Self {
        Self {
            since: Some(UtcDateTime::now().saturating_sub_days(days)),
            ..Self::default()
        }
    }

    fn to_query(&self) -> NewsQuery {
        let mut query = NewsQuery {
            category: self.category.map(|category| category.as_str().to_owned()),
            source_symbol: self.source_symbol.as_ref().map(ToString::to_string),
            min_sentiment: self.min_sentiment,
            max_sentiment: self.max_sentiment,
            published_since: self.since.map(UtcDateTime::to_sql),
            published_until: self.until.map(UtcDateTime::to_sql),
            limit: self.limit,
            ..NewsQuery::default()
        };

        match self.sentiment {
            Some(SentimentLabel::Positive) => {
                query.sentiment_above = Some(SentimentLabel::POSITIVE_THRESHOLD);
            }
            Some(SentimentLabel::Negative) => {
                query.sentiment_below = Some(SentimentLabel::NEGATIVE_THRESHOLD);
            }
            Some(SentimentLabel::Neutral) => {
                query.min_sentiment = Some(
                    query
                        .min_sentiment
                        .map_or(SentimentLabel::NEGATIVE_THRESHOLD, |min| {
                            min.max(SentimentLabel::NEGATIVE_THRESHOLD)
                        }),
                );
                query.max_sentiment = Some(
                    query
                        .max_sentiment
                        .map_or(SentimentLabel::POSITIVE_THRESHOLD, |max| {
                            max.min(SentimentLabel::POSITIVE_THRESHOLD)
                        }),
                );
            }
            None => {}
        }
        query
    }
}

/// Read contracts over the cache.
#[derive(Clone)]
pub struct CacheReader {
    warehouse: Warehouse,
}

impl CacheReader {
    pub fn new(warehouse: Warehouse) -> Self {
        Self { warehouse }
    }

    /// The latest `limit` bars, oldest first.
    pub fn latest_bars(
        &self,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<CachedBar>, CoreError> {
        self.warehouse
            .latest_bars(interval.as_str(), limit)?
            .iter()
            .map(|record| bar_from_record(record).map_err(CoreError::from))
            .collect()
    }

    /// Bars in `[window.start, window.end)`, oldest first.
    pub fn bars_between(
        &self,
        interval: Interval,
        window: TimeRange,
    ) -> Result<Vec<CachedBar>, CoreError> {
        let (start, end) = (window.start.to_sql(), window.end.to_sql());
        self.warehouse
            .bars_between(interval.as_str(), &start, &end)?
            .iter()
            .map(|record| bar_from_record(record).map_err(CoreError::from))
            .collect()
    }

    pub fn price_summary(&self) -> Result<Vec<PriceCacheSummary>, CoreError> {
        Ok(self.warehouse.price_cache_summary()?)
    }

    /// Most recently published first.
    pub fn news(&self, filter: &NewsFilter) -> Result<Vec<NewsItem>, CoreError> {
        self.warehouse
            .query_news(&filter.to_query())?
            .into_iter()
            .map(|record| news_from_record(record).map_err(CoreError::from))
            .collect()
    }

    /// Case-insensitive match on title, summary or keywords.
    pub fn search_news(&self, term: &str, limit: usize) -> Result<Vec<NewsItem>, CoreError> {
        self.warehouse
            .search_news(term, limit)?
            .into_iter()
            .map(|record| news_from_record(record).map_err(CoreError::from))
            .collect()
    }

    pub fn news_summary(&self, top_publishers: usize) -> Result<NewsSummary, CoreError> {
        Ok(self.warehouse.news_summary(top_publishers)?)
    }

    /// Items published at or after `since`, newest first.
    pub fn recent_news(
        &self,
        since: UtcDateTime,
        limit: usize,
    ) -> Result<Vec<NewsItem>, CoreError> {
        self.news(&NewsFilter {
            since: Some(since),
            limit,
            ..NewsFilter::default()
        })
    }

    /// Daily sentiment since `since`; `None` when nothing in the window is scored.
    pub fn sentiment_trend(
        &self,
        since: UtcDateTime,
    ) -> Result<Option<SentimentTrend>, CoreError> {
        let days = self.warehouse.daily_sentiment(&since.to_sql())?;
        Ok(SentimentTrend::from_days(days))
    }

    pub fn category_analysis(
        &self,
        since: UtcDateTime,
    ) -> Result<Option<CategoryAnalysis>, CoreError> {
        let rows = self.warehouse.category_sentiment(&since.to_sql())?;
        Ok(CategoryAnalysis::from_rows(rows))
    }

    /// The `top` most frequent keywords with their sentiment.
    pub fn keyword_analysis(
        &self,
        since: UtcDateTime,
        top: usize,
    ) -> Result<Option<KeywordAnalysis>, CoreError> {
        let rows = self.warehouse.scored_keywords(&since.to_sql())?;
        Ok(KeywordAnalysis::from_rows(&rows, top))
    }

    pub fn publisher_analysis(
        &self,
        since: UtcDateTime,
    ) -> Result<Option<PublisherAnalysis>, CoreError> {
        let rows = self
            .warehouse
            .publisher_sentiment(&since.to_sql(), MIN_PUBLISHER_ITEMS)?;
        Ok(PublisherAnalysis::from_rows(rows))
    }

    /// Audit history, newest first; `target_prefix` such as `"price:"` or `"news:GLD"`.
    pub fn audit(
        &self,
        target_prefix: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FetchAuditEntry>, CoreError> {
        self.warehouse
            .recent_audit(target_prefix, limit)?
            .into_iter()
            .map(|stored| audit_from_stored(stored).map_err(CoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_labels_translate_to_bounds() {
        let positive = NewsFilter {
            sentiment: Some(SentimentLabel::Positive),
            ..NewsFilter::default()
        }
        .to_query();
        assert_eq!(positive.sentiment_above, Some(0.1));
        assert_eq!(positive.min_sentiment, None);

        let neutral = NewsFilter {
            sentiment: Some(SentimentLabel::Neutral),
            min_sentiment: Some(0.0),
            ..NewsFilter::default()
        }
        .to_query();
        assert_eq!(neutral.min_sentiment, Some(0.0));
        assert_eq!(neutral.max_sentiment, Some(0.1));
    }

    #[test]
    fn category_and_symbol_use_stored_spelling() {
        let query = NewsFilter {
            category: Some(NewsCategory::EconomicData),
            source_symbol: Some(Symbol::parse("gc=f").expect("symbol")),
            ..NewsFilter::default()
        }
        .to_query();
        assert_eq!(query.category.as_deref(), Some("economic_data"));
        assert_eq!(query.source_symbol.as_deref(), Some("GC=F"));
    }
}
