use ::duckdb::{Connection, Row, ToSql};
use serde::Serialize;
use tracing::debug;

use crate::records::count_from_sql;
use crate::{
    ensure_limit, finalize_transaction, PriceBarRecord, PriceCacheSummary, Warehouse,
    WarehouseError,
};

const BAR_COLUMNS: &str = "bar_interval, strftime(ts, '%Y-%m-%d %H:%M:%S'), open, high, low, \
                           close, volume, strftime(cached_at, '%Y-%m-%d %H:%M:%S')";

/// How `merge_bars` treats a bar whose (interval, timestamp) is already cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Keep the cached bar.
    InsertMissing,
    /// Overwrite the cached bar with the incoming values.
    Replace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub replaced: usize,
    pub ignored: usize,
}

impl Warehouse {
    /// Cached bar timestamps for `interval` within `[start, end)`, ascending.
    pub fn cached_bar_timestamps(
        &self,
        interval: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<String>, WarehouseError> {
        let connection = self.connection()?;
        let params: [&dyn ToSql; 3] = [&interval, &start, &end];
        let mut statement = connection.prepare(
            "SELECT strftime(ts, '%Y-%m-%d %H:%M:%S') FROM price_bars \
             WHERE bar_interval = ? AND ts >= TRY_CAST(? AS TIMESTAMP) AND ts < TRY_CAST(? AS TIMESTAMP) \
             ORDER BY ts",
        )?;
        let rows = statement.query_map(params.as_slice(), |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Merge bars in a single transaction.
    ///
    /// Either every row of the batch is applied or none is; the error is
    /// reported as [`WarehouseError::Integrity`].
    pub fn merge_bars(
        &self,
        rows: &[PriceBarRecord],
        mode: MergeMode,
    ) -> Result<MergeOutcome, WarehouseError> {
        if rows.is_empty() {
            return Ok(MergeOutcome::default());
        }

        let connection = self.connection()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<MergeOutcome, WarehouseError> {
            let mut outcome = MergeOutcome::default();
            for row in rows {
                if bar_exists(&connection, row)? {
                    match mode {
                        MergeMode::InsertMissing => outcome.ignored += 1,
                        MergeMode::Replace => {
                            replace_bar(&connection, row)?;
                            outcome.replaced += 1;
                        }
                    }
                    continue;
                }

                let params: [&dyn ToSql; 8] = [
                    &row.interval,
                    &row.ts,
                    &row.open,
                    &row.high,
                    &row.low,
                    &row.close,
                    &row.volume,
                    &row.cached_at,
                ];
                connection.execute(
                    "INSERT INTO price_bars \
                     (bar_interval, ts, open, high, low, close, volume, cached_at) \
                     VALUES (?, TRY_CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?, TRY_CAST(? AS TIMESTAMP))",
                    params.as_slice(),
                )?;
                outcome.inserted += 1;
            }
            Ok(outcome)
        })();

        let outcome = finalize_transaction(&connection, result)
            .map_err(|error| WarehouseError::integrity("price bar merge", error))?;
        debug!(
            inserted = outcome.inserted,
            replaced = outcome.replaced,
            ignored = outcome.ignored,
            "merged price bars"
        );
        Ok(outcome)
    }

    /// The most recent `limit` bars for `interval`, returned oldest first.
    pub fn latest_bars(
        &self,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<PriceBarRecord>, WarehouseError> {
        ensure_limit(limit)?;
        let connection = self.connection()?;
        let sql = format!(
            "SELECT {BAR_COLUMNS} FROM price_bars WHERE bar_interval = ? \
             ORDER BY ts DESC LIMIT {limit}"
        );
        let params: [&dyn ToSql; 1] = [&interval];
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map(params.as_slice(), read_bar)?;
        let mut bars = rows.collect::<Result<Vec<_>, _>>()?;
        bars.reverse();
        Ok(bars)
    }

    /// Bars for `interval` within `[start, end)`, ascending.
    pub fn bars_between(
        &self,
        interval: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<PriceBarRecord>, WarehouseError> {
        let connection = self.connection()?;
        let sql = format!(
            "SELECT {BAR_COLUMNS} FROM price_bars \
             WHERE bar_interval = ? AND ts >= TRY_CAST(? AS TIMESTAMP) AND ts < TRY_CAST(? AS TIMESTAMP) \
             ORDER BY ts"
        );
        let params: [&dyn ToSql; 3] = [&interval, &start, &end];
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map(params.as_slice(), read_bar)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn bar_count(&self, interval: &str) -> Result<u64, WarehouseError> {
        let connection = self.connection()?;
        let params: [&dyn ToSql; 1] = [&interval];
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM price_bars WHERE bar_interval = ?",
            params.as_slice(),
            |row| row.get(0),
        )?;
        Ok(count_from_sql(count))
    }

    /// Coverage of every cached interval, ordered by interval label.
    pub fn price_cache_summary(&self) -> Result<Vec<PriceCacheSummary>, WarehouseError> {
        let connection = self.connection()?;
        let mut statement = connection.prepare(
            "SELECT bar_interval, bar_count, strftime(first_ts, '%Y-%m-%d %H:%M:%S'), \
             strftime(last_ts, '%Y-%m-%d %H:%M:%S'), latest_close \
             FROM vw_price_cache_summary ORDER BY bar_interval",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(PriceCacheSummary {
                interval: row.get(0)?,
                bar_count: count_from_sql(row.get(1)?),
                first_ts: row.get(2)?,
                last_ts: row.get(3)?,
                latest_close: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn bar_exists(connection: &Connection, row: &PriceBarRecord) -> Result<bool, ::duckdb::Error> {
    let params: [&dyn ToSql; 2] = [&row.interval, &row.ts];
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM price_bars WHERE bar_interval = ? AND ts = TRY_CAST(? AS TIMESTAMP)",
        params.as_slice(),
        |result| result.get(0),
    )?;
    Ok(count > 0)
}

fn replace_bar(connection: &Connection, row: &PriceBarRecord) -> Result<(), ::duckdb::Error> {
    let params: [&dyn ToSql; 8] = [
        &row.open,
        &row.high,
        &row.low,
        &row.close,
        &row.volume,
        &row.cached_at,
        &row.interval,
        &row.ts,
    ];
    connection.execute(
        "UPDATE price_bars SET open = ?, high = ?, low = ?, close = ?, volume = ?, \
         cached_at = TRY_CAST(? AS TIMESTAMP) \
         WHERE bar_interval = ? AND ts = TRY_CAST(? AS TIMESTAMP)",
        params.as_slice(),
    )?;
    Ok(())
}

fn read_bar(row: &Row<'_>) -> Result<PriceBarRecord, ::duckdb::Error> {
    Ok(PriceBarRecord {
        interval: row.get(0)?,
        ts: row.get(1)?,
        open: row.get(2)?,
        high: row.get(3)?,
        low: row.get(4)?,
        close: row.get(5)?,
        volume: count_from_sql(row.get(6)?),
        cached_at: row.get(7)?,
    })
}
