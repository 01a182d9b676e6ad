use ::duckdb::{Connection, Row, ToSql};
use tracing::debug;

use crate::records::count_from_sql;
use crate::{
    ensure_limit, finalize_transaction, CategoryCount, NewsRecord, NewsSummary, PublisherCount,
    Warehouse, WarehouseError,
};

const NEWS_COLUMNS: &str = "fingerprint, title, summary, source_symbol, publisher, \
                            strftime(published_at, '%Y-%m-%d %H:%M:%S'), link, sentiment_score, \
                            category, keywords, strftime(fetched_at, '%Y-%m-%d %H:%M:%S')";

/// Result of storing one news record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsWrite {
    /// The fingerprint was new and the item was inserted.
    Inserted,
    /// The item existed without sentiment; its enrichment fields were filled in.
    Backfilled,
    /// The item existed and was left untouched.
    Duplicate,
}

/// Filters for reading cached news. All bounds are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsQuery {
    pub category: Option<String>,
    pub source_symbol: Option<String>,
    /// Inclusive lower sentiment bound.
    pub min_sentiment: Option<f64>,
    /// Inclusive upper sentiment bound.
    pub max_sentiment: Option<f64>,
    /// Exclusive lower sentiment bound.
    pub sentiment_above: Option<f64>,
    /// Exclusive upper sentiment bound.
    pub sentiment_below: Option<f64>,
    pub published_since: Option<String>,
    pub published_until: Option<String>,
    pub limit: usize,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            category: None,
            source_symbol: None,
            min_sentiment: None,
            max_sentiment: None,
            sentiment_above: None,
            sentiment_below: None,
            published_since: None,
            published_until: None,
            limit: 50,
        }
    }
}

impl Warehouse {
    /// Store one news record in its own transaction.
    ///
    /// An existing fingerprint is never overwritten, except that missing
    /// sentiment, category and keywords are filled in when the incoming
    /// record carries a sentiment score.
    pub fn store_news(&self, record: &NewsRecord) -> Result<NewsWrite, WarehouseError> {
        let keywords = serde_json::to_string(&record.keywords)?;
        let connection = self.connection()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<NewsWrite, WarehouseError> {
            match sentiment_missing(&connection, &record.fingerprint)? {
                None => {
                    let params: [&dyn ToSql; 11] = [
                        &record.fingerprint,
                        &record.title,
                        &record.summary,
                        &record.source_symbol,
                        &record.publisher,
                        &record.published_at,
                        &record.link,
                        &record.sentiment_score,
                        &record.category,
                        &keywords,
                        &record.fetched_at,
                    ];
                    connection.execute(
                        "INSERT INTO news_items \
                         (fingerprint, title, summary, source_symbol, publisher, published_at, \
                          link, sentiment_score, category, keywords, fetched_at) \
                         VALUES (?, ?, ?, ?, ?, TRY_CAST(? AS TIMESTAMP), ?, ?, ?, ?, TRY_CAST(? AS TIMESTAMP))",
                        params.as_slice(),
                    )?;
                    Ok(NewsWrite::Inserted)
                }
                Some(true) if record.sentiment_score.is_some() => {
                    let params: [&dyn ToSql; 4] = [
                        &record.sentiment_score,
                        &record.category,
                        &keywords,
                        &record.fingerprint,
                    ];
                    connection.execute(
                        "UPDATE news_items SET sentiment_score = ?, category = ?, keywords = ? \
                         WHERE fingerprint = ?",
                        params.as_slice(),
                    )?;
                    Ok(NewsWrite::Backfilled)
                }
                Some(_) => Ok(NewsWrite::Duplicate),
            }
        })();

        let write = finalize_transaction(&connection, result)
            .map_err(|error| WarehouseError::integrity("news item", error))?;
        debug!(fingerprint = %record.fingerprint, ?write, "stored news item");
        Ok(write)
    }

    pub fn news_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<NewsRecord>, WarehouseError> {
        let connection = self.connection()?;
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news_items WHERE fingerprint = ?");
        let params: [&dyn ToSql; 1] = [&fingerprint];
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map(params.as_slice(), read_news)?;
        let mut items = rows.collect::<Result<Vec<_>, _>>()?;
        items.pop().map(RawNews::decode).transpose()
    }

    /// Cached news matching `query`, most recently published first.
    pub fn query_news(&self, query: &NewsQuery) -> Result<Vec<NewsRecord>, WarehouseError> {
        ensure_limit(query.limit)?;

        let mut clauses: Vec<&'static str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(category) = &query.category {
            clauses.push("category = ?");
            params.push(Box::new(category.clone()));
        }
        if let Some(symbol) = &query.source_symbol {
            clauses.push("source_symbol = ?");
            params.push(Box::new(symbol.clone()));
        }
        if let Some(value) = query.min_sentiment {
            clauses.push("sentiment_score >= ?");
            params.push(Box::new(value));
        }
        if let Some(value) = query.max_sentiment {
            clauses.push("sentiment_score <= ?");
            params.push(Box::new(value));
        }
        if let Some(value) = query.sentiment_above {
            clauses.push("sentiment_score > ?");
            params.push(Box::new(value));
        }
        if let Some(value) = query.sentiment_below {
            clauses.push("sentiment_score < ?");
            params.push(Box::new(value));
        }
        if let Some(since) = &query.published_since {
            clauses.push("published_at >= TRY_CAST(? AS TIMESTAMP)");
            params.push(Box::new(since.clone()));
        }
        if let Some(until) = &query.published_until {
            clauses.push("published_at <= TRY_CAST(? AS TIMESTAMP)");
            params.push(Box::new(until.clone()));
        }

        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {NEWS_COLUMNS} FROM news_items {filter} \
             ORDER BY published_at DESC, fingerprint LIMIT {limit}",
            limit = query.limit
        );

        let connection = self.connection()?;
        let refs: Vec<&dyn ToSql> = params.iter().map(|param| param.as_ref()).collect();
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map(refs.as_slice(), read_news)?;
        rows.collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(RawNews::decode)
            .collect()
    }

    /// Case-insensitive substring search over title, summary and keywords.
    ///
    /// Keywords match within a single stored keyword; a term carrying JSON
    /// array punctuation never matches the keyword column.
    pub fn search_news(&self, term: &str, limit: usize) -> Result<Vec<NewsRecord>, WarehouseError> {
        ensure_limit(limit)?;
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Err(WarehouseError::QueryRejected(String::from(
                "search term must not be empty",
            )));
        }

        let keyword_needle =
            (!needle.contains(['[', ']', '"', ',', '\\'])).then(|| needle.clone());

        let connection = self.connection()?;
        let sql = format!(
            "SELECT {NEWS_COLUMNS} FROM news_items \
             WHERE contains(lower(title), ?) OR contains(lower(summary), ?) \
             OR contains(lower(keywords), ?) \
             ORDER BY published_at DESC, fingerprint LIMIT {limit}"
        );
        let params: [&dyn ToSql; 3] = [&needle, &needle, &keyword_needle];
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map(params.as_slice(), read_news)?;
        rows.collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(RawNews::decode)
            .collect()
    }

    pub fn news_count(&self) -> Result<u64, WarehouseError> {
        let connection = self.connection()?;
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM news_items", [], |row| row.get(0))?;
        Ok(count_from_sql(count))
    }

    /// Totals, per-category counts and the busiest publishers.
    pub fn news_summary(&self, top_publishers: usize) -> Result<NewsSummary, WarehouseError> {
        ensure_limit(top_publishers)?;
        let connection = self.connection()?;

        let (total, with_sentiment, average, earliest, latest) = connection.query_row(
            "SELECT COUNT(*), COUNT(sentiment_score), AVG(sentiment_score)::DOUBLE, \
             strftime(MIN(published_at), '%Y-%m-%d %H:%M:%S'), \
             strftime(MAX(published_at), '%Y-%m-%d %H:%M:%S') \
             FROM news_items",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )?;

        let mut statement = connection.prepare(
            "SELECT category, item_count, average_sentiment FROM vw_news_categories \
             ORDER BY item_count DESC, category",
        )?;
        let categories = statement
            .query_map([], |row| {
                Ok(CategoryCount {
                    category: row.get(0)?,
                    item_count: count_from_sql(row.get(1)?),
                    average_sentiment: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let sql = format!(
            "SELECT publisher, item_count FROM vw_news_publishers \
             ORDER BY item_count DESC, publisher LIMIT {top_publishers}"
        );
        let mut statement = connection.prepare(sql.as_str())?;
        let publishers = statement
            .query_map([], |row| {
                Ok(PublisherCount {
                    publisher: row.get(0)?,
                    item_count: count_from_sql(row.get(1)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewsSummary {
            total_items: count_from_sql(total),
            items_with_sentiment: count_from_sql(with_sentiment),
            average_sentiment: average,
            earliest_published: earliest,
            latest_published: latest,
            categories,
            top_publishers: publishers,
        })
    }
}

/// `Some(true)` when the fingerprint exists without sentiment, `None` when absent.
fn sentiment_missing(
    connection: &Connection,
    fingerprint: &str,
) -> Result<Option<bool>, ::duckdb::Error> {
    let params: [&dyn ToSql; 1] = [&fingerprint];
    let mut statement =
        connection.prepare("SELECT sentiment_score IS NULL FROM news_items WHERE fingerprint = ?")?;
    let mut rows = statement.query(params.as_slice())?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

struct RawNews {
    record: NewsRecord,
    keywords: String,
}

impl RawNews {
    fn decode(self) -> Result<NewsRecord, WarehouseError> {
        let mut record = self.record;
        record.keywords = serde_json::from_str(&self.keywords)?;
        Ok(record)
    }
}

fn read_news(row: &Row<'_>) -> Result<RawNews, ::duckdb::Error> {
    Ok(RawNews {
        record: NewsRecord {
            fingerprint: row.get(0)?,
            title: row.get(1)?,
            summary: row.get(2)?,
            source_symbol: row.get(3)?,
            publisher: row.get(4)?,
            published_at: row.get(5)?,
            link: row.get(6)?,
            sentiment_score: row.get(7)?,
            category: row.get(8)?,
            keywords: Vec::new(),
            fetched_at: row.get(10)?,
        },
        keywords: row.get(9)?,
    })
}
