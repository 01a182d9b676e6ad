//! Database views backing the summary read paths.

use ::duckdb::Connection;

/// Create database views for cache summaries.
///
/// Creates the following views:
/// - `vw_price_cache_summary`: bar count, first/last timestamp and latest close per interval
/// - `vw_news_categories`: item count and average sentiment per category
/// - `vw_news_publishers`: item count per publisher
/// - `vw_news_scored`: news items that carry a sentiment score, with their publish day
///
/// # Errors
/// Returns an error if the view creation SQL fails to execute.
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE VIEW vw_price_cache_summary AS
SELECT
    bar_interval,
    COUNT(*) AS bar_count,
    MIN(ts) AS first_ts,
    MAX(ts) AS last_ts,
    arg_max(close, ts) AS latest_close
FROM price_bars
GROUP BY bar_interval;

CREATE OR REPLACE VIEW vw_news_categories AS
SELECT
    COALESCE(category, 'unclassified') AS category,
    COUNT(*) AS item_count,
    AVG(sentiment_score)::DOUBLE AS average_sentiment
FROM news_items
GROUP BY COALESCE(category, 'unclassified');

CREATE OR REPLACE VIEW vw_news_publishers AS
SELECT
    publisher,
    COUNT(*) AS item_count
FROM news_items
GROUP BY publisher;

CREATE OR REPLACE VIEW vw_news_scored AS
SELECT
    fingerprint,
    published_at,
    CAST(published_at AS DATE) AS published_day,
    publisher,
    category,
    keywords,
    sentiment_score
FROM news_items
WHERE sentiment_score IS NOT NULL;
",
    )?;

    Ok(())
}
