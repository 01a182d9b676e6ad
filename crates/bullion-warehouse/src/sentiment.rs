//! Sentiment aggregates over scored news, read through `vw_news_scored`.
//!
//! Every query takes an inclusive `published_since` bound in the warehouse
//! timestamp layout.

use ::duckdb::ToSql;

use crate::records::count_from_sql;
use crate::{
    CategorySentiment, DailySentiment, PublisherSentiment, ScoredKeywords, Warehouse,
    WarehouseError,
};

impl Warehouse {
    /// Per-day average sentiment, oldest day first.
    pub fn daily_sentiment(
        &self,
        published_since: &str,
    ) -> Result<Vec<DailySentiment>, WarehouseError> {
        let connection = self.connection()?;
        let params: [&dyn ToSql; 1] = [&published_since];
        let mut statement = connection.prepare(
            "SELECT strftime(published_day, '%Y-%m-%d'), AVG(sentiment_score)::DOUBLE, COUNT(*) \
             FROM vw_news_scored WHERE published_at >= TRY_CAST(? AS TIMESTAMP) \
             GROUP BY published_day ORDER BY published_day",
        )?;
        let rows = statement.query_map(params.as_slice(), |row| {
            Ok(DailySentiment {
                day: row.get(0)?,
                average_sentiment: row.get(1)?,
                item_count: count_from_sql(row.get(2)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Sentiment spread per category, most covered first.
    pub fn category_sentiment(
        &self,
        published_since: &str,
    ) -> Result<Vec<CategorySentiment>, WarehouseError> {
        let connection = self.connection()?;
        let params: [&dyn ToSql; 1] = [&published_since];
        let mut statement = connection.prepare(
            "SELECT category, COUNT(*), AVG(sentiment_score)::DOUBLE, \
             MAX(sentiment_score), MIN(sentiment_score) \
             FROM vw_news_scored \
             WHERE category IS NOT NULL AND published_at >= TRY_CAST(? AS TIMESTAMP) \
             GROUP BY category ORDER BY COUNT(*) DESC, category",
        )?;
        let rows = statement.query_map(params.as_slice(), |row| {
            Ok(CategorySentiment {
                category: row.get(0)?,
                item_count: count_from_sql(row.get(1)?),
                average_sentiment: row.get(2)?,
                max_sentiment: row.get(3)?,
                min_sentiment: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Publishers with at least `min_items` scored items, most active first.
    pub fn publisher_sentiment(
        &self,
        published_since: &str,
        min_items: u64,
    ) -> Result<Vec<PublisherSentiment>, WarehouseError> {
        let min_items = i64::try_from(min_items).unwrap_or(i64::MAX);
        let connection = self.connection()?;
        let params: [&dyn ToSql; 2] = [&published_since, &min_items];
        let mut statement = connection.prepare(
            "SELECT publisher, COUNT(*), AVG(sentiment_score)::DOUBLE, \
             stddev_pop(sentiment_score)::DOUBLE \
             FROM vw_news_scored WHERE published_at >= TRY_CAST(? AS TIMESTAMP) \
             GROUP BY publisher HAVING COUNT(*) >= ? \
             ORDER BY COUNT(*) DESC, publisher",
        )?;
        let rows = statement.query_map(params.as_slice(), |row| {
            Ok(PublisherSentiment {
                publisher: row.get(0)?,
                item_count: count_from_sql(row.get(1)?),
                average_sentiment: row.get(2)?,
                sentiment_std: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Keyword lists of scored items, in publish order.
    pub fn scored_keywords(
        &self,
        published_since: &str,
    ) -> Result<Vec<ScoredKeywords>, WarehouseError> {
        let connection = self.connection()?;
        let params: [&dyn ToSql; 1] = [&published_since];
        let mut statement = connection.prepare(
            "SELECT keywords, sentiment_score FROM vw_news_scored \
             WHERE keywords <> '[]' AND published_at >= TRY_CAST(? AS TIMESTAMP) \
             ORDER BY published_at, fingerprint",
        )?;
        let rows = statement.query_map(params.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(keywords, sentiment_score)| -> Result<_, WarehouseError> {
                Ok(ScoredKeywords {
                    keywords: serde_json::from_str(&keywords)?,
                    sentiment_score,
                })
            })
            .collect()
    }
}
