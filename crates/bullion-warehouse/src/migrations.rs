use ::duckdb::{Connection, ToSql};
use tracing::info;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_cache_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS price_bars (
    bar_interval TEXT NOT NULL,
    ts TIMESTAMP NOT NULL,
    open DOUBLE NOT NULL,
    high DOUBLE NOT NULL,
    low DOUBLE NOT NULL,
    close DOUBLE NOT NULL,
    volume BIGINT NOT NULL,
    cached_at TIMESTAMP NOT NULL,
    PRIMARY KEY(bar_interval, ts)
);

CREATE TABLE IF NOT EXISTS news_items (
    fingerprint TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    summary TEXT NOT NULL,
    source_symbol TEXT NOT NULL,
    publisher TEXT NOT NULL,
    published_at TIMESTAMP NOT NULL,
    link TEXT,
    sentiment_score DOUBLE,
    category TEXT,
    keywords TEXT NOT NULL,
    fetched_at TIMESTAMP NOT NULL
);
"#,
    },
    Migration {
        version: "0002_ledgers",
        sql: r#"
CREATE SEQUENCE IF NOT EXISTS fetch_audit_id_seq START 1;
CREATE SEQUENCE IF NOT EXISTS recommendations_id_seq START 1;

CREATE TABLE IF NOT EXISTS fetch_audit (
    id BIGINT PRIMARY KEY,
    target TEXT NOT NULL,
    range_start TIMESTAMP,
    range_end TIMESTAMP,
    fetched_count BIGINT NOT NULL,
    succeeded BOOLEAN NOT NULL,
    error_detail TEXT,
    occurred_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS recommendations (
    id BIGINT PRIMARY KEY,
    generated_at TIMESTAMP NOT NULL,
    interval_used TEXT NOT NULL,
    hours_analyzed BIGINT NOT NULL,
    reference_price DOUBLE,
    recommendation_text TEXT NOT NULL,
    input_data_point_count BIGINT NOT NULL,
    succeeded BOOLEAN NOT NULL
);
"#,
    },
    Migration {
        version: "0003_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_fetch_audit_target ON fetch_audit(target, occurred_at);
CREATE INDEX IF NOT EXISTS idx_recommendations_generated_at ON recommendations(generated_at);
"#,
    },
];

/// Apply every migration not yet recorded in `schema_migrations`.
pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let params: [&dyn ToSql; 1] = [&migration.version];
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params.as_slice(),
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params.as_slice(),
            )?;
            info!(version = migration.version, "applied warehouse migration");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_applied_once() {
        let connection = Connection::open_in_memory().expect("in-memory db");

        apply_migrations(&connection).expect("first run");
        apply_migrations(&connection).expect("second run");

        let applied: i64 = connection
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .expect("count");
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }
}
