//! Conversions between domain types and warehouse rows.

use std::str::FromStr;

use bullion_warehouse::{
    FetchAuditRecord, NewsRecord, PriceBarRecord, RecommendationRecord, StoredFetchAudit,
    StoredRecommendation as StoredRecommendationRecord,
};

use crate::{
    CachedBar, FetchAuditEntry, Interval, NewsCategory, NewsItem, PriceBar, Recommendation,
    StoredRecommendation, Symbol, UtcDateTime, ValidationError,
};

pub(crate) fn bar_to_record(bar: &PriceBar, cached_at: UtcDateTime) -> PriceBarRecord {
    PriceBarRecord {
        interval: bar.interval.to_string(),
        ts: bar.ts.to_sql(),
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
        volume: bar.volume,
        cached_at: cached_at.to_sql(),
    }
}

pub(crate) fn bar_from_record(record: &PriceBarRecord) -> Result<CachedBar, ValidationError> {
    let bar = PriceBar::new(
        UtcDateTime::from_sql(&record.ts)?,
        Interval::from_str(&record.interval)?,
        record.open,
        record.high,
        record.low,
        record.close,
        record.volume,
    )?;
    Ok(CachedBar {
        bar,
        cached_at: UtcDateTime::from_sql(&record.cached_at)?,
    })
}

pub(crate) fn news_to_record(item: &NewsItem) -> NewsRecord {
    NewsRecord {
        fingerprint: item.fingerprint.clone(),
        title: item.title.clone(),
        summary: item.summary.clone(),
        source_symbol: item.source_symbol.to_string(),
        publisher: item.publisher.clone(),
        published_at: item.published_at.to_sql(),
        link: item.link.clone(),
        sentiment_score: item.sentiment_score,
        category: item.category.map(|category| category.as_str().to_owned()),
        keywords: item.keywords.clone(),
        fetched_at: item.fetched_at.to_sql(),
    }
}

pub(crate) fn news_from_record(record: NewsRecord) -> Result<NewsItem, ValidationError> {
    Ok(NewsItem {
        source_symbol: Symbol::parse(&record.source_symbol)?,
        published_at: UtcDateTime::from_sql(&record.published_at)?,
        fetched_at: UtcDateTime::from_sql(&record.fetched_at)?,
        category: record
            .category
            .as_deref()
            .map(NewsCategory::from_str)
            .transpose()?,
        fingerprint: record.fingerprint,
        title: record.title,
        summary: record.summary,
        publisher: record.publisher,
        link: record.link,
        sentiment_score: record.sentiment_score,
        keywords: record.keywords,
    })
}

pub(crate) fn audit_to_record(entry: &FetchAuditEntry) -> FetchAuditRecord {
    FetchAuditRecord {
        target: entry.target.clone(),
        range_start: entry.range_start.map(UtcDateTime::to_sql),
        range_end: entry.range_end.map(UtcDateTime::to_sql),
        fetched_count: entry.fetched_count,
        succeeded: entry.succeeded,
        error_detail: entry.error_detail.clone(),
        occurred_at: entry.occurred_at.to_sql(),
    }
}

pub(crate) fn audit_from_stored(stored: StoredFetchAudit) -> Result<FetchAuditEntry, ValidationError> {
    let record = stored.record;
    Ok(FetchAuditEntry {
        id: Some(stored.id),
        range_start: record.range_start.as_deref().map(UtcDateTime::from_sql).transpose()?,
        range_end: record.range_end.as_deref().map(UtcDateTime::from_sql).transpose()?,
        occurred_at: UtcDateTime::from_sql(&record.occurred_at)?,
        target: record.target,
        fetched_count: record.fetched_count,
        succeeded: record.succeeded,
        error_detail: record.error_detail,
    })
}

pub(crate) fn recommendation_to_record(entry: &Recommendation) -> RecommendationRecord {
    RecommendationRecord {
        generated_at: entry.generated_at.to_sql(),
        interval_used: entry.interval_used.to_string(),
        hours_analyzed: entry.hours_analyzed,
        reference_price: entry.reference_price,
        recommendation_text: entry.recommendation_text.clone(),
        input_data_point_count: entry.input_data_point_count,
        succeeded: entry.succeeded,
    }
}

pub(crate) fn recommendation_from_stored(
    stored: StoredRecommendationRecord,
) -> Result<StoredRecommendation, ValidationError> {
    let record = stored.record;
    Ok(StoredRecommendation {
        id: stored.id,
        recommendation: Recommendation {
            generated_at: UtcDateTime::from_sql(&record.generated_at)?,
            interval_used: Interval::from_str(&record.interval_used)?,
            hours_analyzed: record.hours_analyzed,
            reference_price: record.reference_price,
            recommendation_text: record.recommendation_text,
            input_data_point_count: record.input_data_point_count,
            succeeded: record.succeeded,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_item_survives_the_row_mapping() {
        let item = NewsItem {
            fingerprint: String::from("ab12"),
            title: String::from("Fed holds rates"),
            summary: String::new(),
            source_symbol: Symbol::parse("GLD").expect("symbol"),
            publisher: String::from("Reuters"),
            published_at: UtcDateTime::parse("2026-03-02T14:00:00Z").expect("ts"),
            link: None,
            sentiment_score: Some(-0.25),
            category: Some(NewsCategory::MonetaryPolicy),
            keywords: vec![String::from("fed"), String::from("rates")],
            fetched_at: UtcDateTime::parse("2026-03-02T15:00:00Z").expect("ts"),
        };

        let record = news_to_record(&item);
        assert_eq!(record.category.as_deref(), Some("monetary_policy"));
        assert_eq!(record.published_at, "2026-03-02 14:00:00");
        assert_eq!(news_from_record(record).expect("back"), item);
    }
}
