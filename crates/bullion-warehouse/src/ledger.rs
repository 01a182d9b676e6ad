//! Append-only tables: the fetch audit trail and the recommendation ledger.

use ::duckdb::{Connection, Row, ToSql};

use crate::records::count_from_sql;
use crate::{
    ensure_limit, FetchAuditRecord, RecommendationRecord, StoredFetchAudit, StoredRecommendation,
    Warehouse, WarehouseError,
};

impl Warehouse {
    /// Append one fetch attempt and return its id.
    pub fn append_audit(&self, record: &FetchAuditRecord) -> Result<i64, WarehouseError> {
        let connection = self.connection()?;
        let id = next_id(&connection, "fetch_audit_id_seq")?;
        let params: [&dyn ToSql; 8] = [
            &id,
            &record.target,
            &record.range_start,
            &record.range_end,
            &record.fetched_count,
            &record.succeeded,
            &record.error_detail,
            &record.occurred_at,
        ];
        connection.execute(
            "INSERT INTO fetch_audit \
             (id, target, range_start, range_end, fetched_count, succeeded, error_detail, occurred_at) \
             VALUES (?, ?, TRY_CAST(? AS TIMESTAMP), TRY_CAST(? AS TIMESTAMP), ?, ?, ?, TRY_CAST(? AS TIMESTAMP))",
            params.as_slice(),
        )?;
        Ok(id)
    }

    /// Most recent audit entries first, optionally restricted to targets
    /// starting with `target_prefix` (e.g. `"news:"`).
    pub fn recent_audit(
        &self,
        target_prefix: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredFetchAudit>, WarehouseError> {
        ensure_limit(limit)?;
        let connection = self.connection()?;
        let prefix = target_prefix.unwrap_or_default();
        let sql = format!(
            "SELECT id, target, strftime(range_start, '%Y-%m-%d %H:%M:%S'), \
             strftime(range_end, '%Y-%m-%d %H:%M:%S'), fetched_count, succeeded, error_detail, \
             strftime(occurred_at, '%Y-%m-%d %H:%M:%S') \
             FROM fetch_audit WHERE starts_with(target, ?) \
             ORDER BY occurred_at DESC, id DESC LIMIT {limit}"
        );
        let params: [&dyn ToSql; 1] = [&prefix];
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map(params.as_slice(), read_audit)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Append one recommendation and return its id.
    pub fn insert_recommendation(
        &self,
        record: &RecommendationRecord,
    ) -> Result<i64, WarehouseError> {
        let connection = self.connection()?;
        let id = next_id(&connection, "recommendations_id_seq")?;
        let params: [&dyn ToSql; 8] = [
            &id,
            &record.generated_at,
            &record.interval_used,
            &record.hours_analyzed,
            &record.reference_price,
            &record.recommendation_text,
            &record.input_data_point_count,
            &record.succeeded,
        ];
        connection.execute(
            "INSERT INTO recommendations \
             (id, generated_at, interval_used, hours_analyzed, reference_price, \
              recommendation_text, input_data_point_count, succeeded) \
             VALUES (?, TRY_CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?, ?)",
            params.as_slice(),
        )?;
        Ok(id)
    }

    /// Most recent recommendations first; ties on `generated_at` fall back
    /// to insertion order.
    pub fn recent_recommendations(
        &self,
        limit: usize,
        succeeded_only: bool,
    ) -> Result<Vec<StoredRecommendation>, WarehouseError> {
        ensure_limit(limit)?;
        let connection = self.connection()?;
        let filter = if succeeded_only {
            "WHERE succeeded"
        } else {
            ""
        };
        let sql = format!(
            "SELECT id, strftime(generated_at, '%Y-%m-%d %H:%M:%S'), interval_used, hours_analyzed, \
             reference_price, recommendation_text, input_data_point_count, succeeded \
             FROM recommendations {filter} \
             ORDER BY generated_at DESC, id DESC LIMIT {limit}"
        );
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map([], read_recommendation)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

// Sequence names are compile-time constants; nextval needs a literal.
fn next_id(connection: &Connection, sequence: &'static str) -> Result<i64, ::duckdb::Error> {
    let sql = format!("SELECT nextval('{sequence}')");
    connection.query_row(sql.as_str(), [], |row| row.get(0))
}

fn read_audit(row: &Row<'_>) -> Result<StoredFetchAudit, ::duckdb::Error> {
    Ok(StoredFetchAudit {
        id: row.get(0)?,
        record: FetchAuditRecord {
            target: row.get(1)?,
            range_start: row.get(2)?,
            range_end: row.get(3)?,
            fetched_count: count_from_sql(row.get(4)?),
            succeeded: row.get(5)?,
            error_detail: row.get(6)?,
            occurred_at: row.get(7)?,
        },
    })
}

fn read_recommendation(row: &Row<'_>) -> Result<StoredRecommendation, ::duckdb::Error> {
    let hours: i64 = row.get(3)?;
    Ok(StoredRecommendation {
        id: row.get(0)?,
        record: RecommendationRecord {
            generated_at: row.get(1)?,
            interval_used: row.get(2)?,
            hours_analyzed: u32::try_from(hours).unwrap_or_default(),
            reference_price: row.get(4)?,
            recommendation_text: row.get(5)?,
            input_data_point_count: count_from_sql(row.get(6)?),
            succeeded: row.get(7)?,
        },
    })
}
