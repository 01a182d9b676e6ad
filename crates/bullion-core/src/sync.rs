//! Fetch-if-needed synchronization of price bars.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use bullion_warehouse::{MergeMode, Warehouse};

use crate::records::{audit_to_record, bar_to_record};
use crate::retry::{call_with_retry, serialize_delay_ms};
use crate::{
    AuditTarget, BarsRequest, CallPacer, CoreError, FailureKind, FetchAuditEntry, GapDetector,
    Interval, PriceBar, PriceSource, RetryConfig, SourceError, SourceErrorKind, Symbol, TimeRange,
    UtcDateTime,
};

/// Whether cached bars are trusted or re-fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Fetch only the gaps; cached bars are never touched.
    #[default]
    Incremental,
    /// Fetch the whole window and overwrite cached bars.
    Revalidate,
}

/// Settings for [`PriceSyncEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Instrument whose bars are cached.
    pub symbol: Symbol,
    pub retry: RetryConfig,
    /// Minimum spacing between provider calls.
    pub call_delay: Duration,
}

/// Outcome of one sync call: how many units succeeded and why the rest did not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub interval: Interval,
    pub bars_added: u64,
    pub bars_revalidated: u64,
    pub bars_rejected: u64,
    /// Sub-ranges the provider was asked for.
    pub ranges_fetched: u64,
    pub ranges_succeeded: u64,
    pub ranges_failed: u64,
    /// Sub-ranges left untried after a rate limit.
    pub ranges_skipped: u64,
    /// Provider calls including retries.
    pub provider_calls: u64,
    pub first_error: Option<String>,
    /// Set when the provider kept rate-limiting; carries the backoff already spent.
    #[serde(rename = "rate_limited_ms", serialize_with = "serialize_delay_ms")]
    pub rate_limited: Option<Duration>,
}

impl SyncReport {
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            bars_added: 0,
            bars_revalidated: 0,
            bars_rejected: 0,
            ranges_fetched: 0,
            ranges_succeeded: 0,
            ranges_failed: 0,
            ranges_skipped: 0,
            provider_calls: 0,
            first_error: None,
            rate_limited: None,
        }
    }

    pub fn ranges_total(&self) -> u64 {
        self.ranges_fetched + self.ranges_skipped
    }

    /// Every sub-range was fetched and stored.
    pub fn is_complete(&self) -> bool {
        self.ranges_failed == 0 && self.ranges_skipped == 0
    }

    fn note_error(&mut self, detail: String) {
        if self.first_error.is_none() {
            self.first_error = Some(detail);
        }
    }
}

/// Requests only the missing sub-ranges from the price provider and merges
/// validated bars into the cache.
pub struct PriceSyncEngine {
    warehouse: Warehouse,
    gaps: GapDetector,
    source: Arc<dyn PriceSource>,
    config: SyncConfig,
    pacer: CallPacer,
}

impl PriceSyncEngine {
    pub fn new(warehouse: Warehouse, source: Arc<dyn PriceSource>, config: SyncConfig) -> Self {
        Self {
            gaps: GapDetector::new(warehouse.clone()),
            pacer: CallPacer::new(config.call_delay),
            warehouse,
            source,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Incremental sync of `[start, end)`.
    pub fn sync(
        &self,
        interval: Interval,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<SyncReport, CoreError> {
        self.sync_with(interval, start, end, FetchMode::Incremental)
    }

    pub fn sync_with(
        &self,
        interval: Interval,
        start: UtcDateTime,
        end: UtcDateTime,
        mode: FetchMode,
    ) -> Result<SyncReport, CoreError> {
        let window = TimeRange::new(start, end)?;
        let ranges = match mode {
            FetchMode::Incremental => self.gaps.missing_ranges(interval, start, end)?,
            FetchMode::Revalidate => aligned_window(interval, window)?.into_iter().collect(),
        };

        let target = AuditTarget::Price(interval);
        let mut report = SyncReport::new(interval);
        for (index, range) in ranges.iter().enumerate() {
            if report.rate_limited.is_some() {
                report.ranges_skipped = (ranges.len() - index) as u64;
                break;
            }
            self.sync_range(&target, interval, *range, mode, &mut report);
        }

        info!(
            symbol = %self.config.symbol,
            interval = %interval,
            ?mode,
            bars_added = report.bars_added,
            bars_revalidated = report.bars_revalidated,
            ranges_fetched = report.ranges_fetched,
            ranges_failed = report.ranges_failed,
            ranges_skipped = report.ranges_skipped,
            "price sync finished"
        );
        Ok(report)
    }

    /// Sync the last `days` days up to the most recent completed grid point.
    pub fn sync_recent(&self, interval: Interval, days: u32) -> Result<SyncReport, CoreError> {
        let end = interval.floor(UtcDateTime::now())?;
        self.sync(interval, end.saturating_sub_days(days), end)
    }

    /// [`Self::sync_recent`] for each interval in turn. Stops early once the
    /// provider rate-limits, leaving later intervals for the next run.
    pub fn sync_all(
        &self,
        intervals: &[Interval],
        days: u32,
    ) -> Result<Vec<SyncReport>, CoreError> {
        let mut reports = Vec::with_capacity(intervals.len());
        for interval in intervals {
            let report = self.sync_recent(*interval, days)?;
            let rate_limited = report.rate_limited.is_some();
            reports.push(report);
            if rate_limited {
                warn!(interval = %interval, "rate limited; remaining intervals not synced");
                break;
            }
        }
        Ok(reports)
    }

    fn sync_range(
        &self,
        target: &AuditTarget,
        interval: Interval,
        range: TimeRange,
        mode: FetchMode,
        report: &mut SyncReport,
    ) {
        let request = BarsRequest {
            symbol: self.config.symbol.clone(),
            interval,
            start: range.start,
            end: range.end,
        };
        debug!(interval = %interval, start = %range.start, end = %range.end, "fetching bars");

        report.ranges_fetched += 1;
        let outcome = call_with_retry(&self.config.retry, |_| {
            self.pacer.wait();
            self.source.fetch_bars(&request)
        });
        report.provider_calls += u64::from(outcome.attempts);

        let raw_bars = match outcome.result {
            Ok(raw_bars) => raw_bars,
            Err(error) => {
                let kind = failure_kind(&error);
                warn!(
                    interval = %interval,
                    start = %range.start,
                    error = %error,
                    "bar fetch failed"
                );
                report.ranges_failed += 1;
                report.note_error(kind.detail(&error));
                if error.is_rate_limited() {
                    report.rate_limited = Some(outcome.waited);
                }
                self.audit(
                    FetchAuditEntry::failure(target, kind, &error)
                        .with_range(range.start, range.end),
                );
                return;
            }
        };

        let mut accepted = BTreeMap::new();
        for raw in &raw_bars {
            match PriceBar::from_raw(raw, interval) {
                Ok(bar) if bar.ts < range.start || bar.ts >= range.end => {
                    debug!(ts = %bar.ts, "ignoring bar outside the requested range");
                }
                Ok(bar) => {
                    accepted.entry(bar.ts).or_insert(bar);
                }
                Err(error) => {
                    let at = raw.timestamp.map_or_else(|| String::from("?"), |ts| ts.to_string());
                    let detail = format!("bar at {at}: {error}");
                    warn!(interval = %interval, %detail, "rejected price bar");
                    report.bars_rejected += 1;
                    report.note_error(FailureKind::Validation.detail(&detail));
                    self.audit(
                        FetchAuditEntry::failure(target, FailureKind::Validation, detail)
                            .with_range(range.start, range.end)
                            .with_fetched_count(1),
                    );
                }
            }
        }

        let cached_at = UtcDateTime::now();
        let rows: Vec<_> = accepted
            .values()
            .map(|bar| bar_to_record(bar, cached_at))
            .collect();
        let merge_mode = match mode {
            FetchMode::Incremental => MergeMode::InsertMissing,
            FetchMode::Revalidate => MergeMode::Replace,
        };
        let fetched_count = raw_bars.len() as u64;

        match self.warehouse.merge_bars(&rows, merge_mode) {
            Ok(merged) => {
                report.ranges_succeeded += 1;
                report.bars_added += merged.inserted as u64;
                report.bars_revalidated += merged.replaced as u64;
                self.audit(
                    FetchAuditEntry::success(target, fetched_count)
                        .with_range(range.start, range.end),
                );
            }
            Err(error) => {
                warn!(interval = %interval, start = %range.start, error = %error, "bar merge failed");
                report.ranges_failed += 1;
                report.note_error(FailureKind::StoreIntegrity.detail(&error));
                self.audit(
                    FetchAuditEntry::failure(target, FailureKind::StoreIntegrity, &error)
                        .with_range(range.start, range.end)
                        .with_fetched_count(fetched_count),
                );
            }
        }
    }

    fn audit(&self, entry: FetchAuditEntry) {
        if let Err(error) = self.warehouse.append_audit(&audit_to_record(&entry)) {
            warn!(audit_target = %entry.target, error = %error, "failed to append fetch audit entry");
        }
    }
}

/// The part of `window` that starts on the grid, or `None` if it holds no grid point.
fn aligned_window(interval: Interval, window: TimeRange) -> Result<Option<TimeRange>, CoreError> {
    let first = interval.align_up(window.start.unix_timestamp());
    if first >= window.end.unix_timestamp() {
        return Ok(None);
    }
    Ok(Some(TimeRange {
        start: UtcDateTime::from_unix(first)?,
        end: window.end,
    }))
}

pub(crate) fn failure_kind(error: &SourceError) -> FailureKind {
    match error.kind() {
        SourceErrorKind::Unavailable => FailureKind::ProviderTransient,
        SourceErrorKind::RateLimited => FailureKind::ProviderRateLimit,
        SourceErrorKind::InvalidRequest | SourceErrorKind::Internal => FailureKind::ProviderRejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revalidation_window_starts_on_the_grid() {
        let window = TimeRange::new(
            UtcDateTime::parse("2026-03-02T00:05:00Z").expect("ts"),
            UtcDateTime::parse("2026-03-02T01:00:00Z").expect("ts"),
        )
        .expect("window");

        let aligned = aligned_window(Interval::FifteenMinutes, window)
            .expect("aligned")
            .expect("has grid points");
        assert_eq!(aligned.start.format_rfc3339(), "2026-03-02T00:15:00Z");

        let empty = aligned_window(Interval::OneDay, window).expect("aligned");
        assert_eq!(empty, None);
    }

    #[test]
    fn provider_errors_map_to_audit_kinds() {
        assert_eq!(
            failure_kind(&SourceError::unavailable("timeout")),
            FailureKind::ProviderTransient
        );
        assert_eq!(
            failure_kind(&SourceError::rate_limited("429")),
            FailureKind::ProviderRateLimit
        );
        assert_eq!(
            failure_kind(&SourceError::invalid_request("no such symbol")),
            FailureKind::ProviderRejected
        );
    }

    #[test]
    fn report_serializes_the_rate_limit_in_millis() {
        let mut report = SyncReport::new(Interval::FifteenMinutes);
        report.rate_limited = Some(Duration::from_millis(1_500));
        let value = serde_json::to_value(&report).expect("json");
        assert_eq!(value["rate_limited_ms"], 1_500);
        assert_eq!(value["interval"], "15m");
    }
}
