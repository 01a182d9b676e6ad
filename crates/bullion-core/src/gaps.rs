//! Missing-range computation over the interval grid.

use serde::Serialize;

use bullion_warehouse::Warehouse;

use crate::{CoreError, Interval, UtcDateTime, ValidationError};

/// Half-open window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: UtcDateTime,
    pub end: UtcDateTime,
}

impl TimeRange {
    pub fn new(start: UtcDateTime, end: UtcDateTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidRange {
                start: start.format_rfc3339(),
                end: end.format_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Grid points of `interval` inside the window.
    pub fn grid_len(&self, interval: Interval) -> u64 {
        let first = interval.align_up(self.start.unix_timestamp());
        let end = self.end.unix_timestamp();
        if first >= end {
            return 0;
        }
        u64::try_from((end - first - 1) / interval.step_seconds() + 1).unwrap_or_default()
    }
}

/// Computes which grid points of a window are absent from the cache.
#[derive(Clone)]
pub struct GapDetector {
    warehouse: Warehouse,
}

impl GapDetector {
    pub fn new(warehouse: Warehouse) -> Self {
        Self { warehouse }
    }

    /// Lazy iterator over the missing sub-ranges, loaded fresh from the cache.
    pub fn gaps(
        &self,
        interval: Interval,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<GapIter, CoreError> {
        let window = TimeRange::new(start, end)?;
        let cached = self
            .warehouse
            .cached_bar_timestamps(interval.as_str(), &start.to_sql(), &end.to_sql())?
            .iter()
            .map(|ts| UtcDateTime::from_sql(ts).map(UtcDateTime::unix_timestamp))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GapIter::new(interval, window, cached))
    }

    /// Ordered, non-overlapping `(first_missing, last_missing + step)` ranges.
    pub fn missing_ranges(
        &self,
        interval: Interval,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<Vec<TimeRange>, CoreError> {
        Ok(self.gaps(interval, start, end)?.collect())
    }
}

/// Walks the expected grid against the cached timestamps.
///
/// Cloning the iterator restarts the walk from the clone point. A gap whose
/// last grid step would end past the representable calendar is clamped to
/// the window end.
#[derive(Debug, Clone)]
pub struct GapIter {
    window: TimeRange,
    step: i64,
    cursor: i64,
    end: i64,
    cached: Vec<i64>,
    next_cached: usize,
}

impl GapIter {
    /// `cached` must be sorted ascending.
    pub fn new(interval: Interval, window: TimeRange, cached: Vec<i64>) -> Self {
        Self {
            window,
            step: interval.step_seconds(),
            cursor: interval.align_up(window.start.unix_timestamp()),
            end: window.end.unix_timestamp(),
            cached,
            next_cached: 0,
        }
    }

    fn is_cached(&mut self, point: i64) -> bool {
        while self
            .cached
            .get(self.next_cached)
            .is_some_and(|&ts| ts < point)
        {
            self.next_cached += 1;
        }
        self.cached.get(self.next_cached) == Some(&point)
    }
}

impl Iterator for GapIter {
    type Item = TimeRange;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.end && self.is_cached(self.cursor) {
            self.cursor += self.step;
        }
        if self.cursor >= self.end {
            return None;
        }

        let first_missing = self.cursor;
        let mut last_missing = first_missing;
        self.cursor += self.step;
        while self.cursor < self.end && !self.is_cached(self.cursor) {
            last_missing = self.cursor;
            self.cursor += self.step;
        }

        let start = UtcDateTime::from_unix(first_missing);
        debug_assert!(start.is_ok(), "grid point {first_missing} outside the window");
        Some(TimeRange {
            start: start.unwrap_or(self.window.start),
            end: UtcDateTime::from_unix(last_missing.saturating_add(self.step))
                .unwrap_or(self.window.end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(value: &str) -> UtcDateTime {
        UtcDateTime::parse(value).expect("timestamp")
    }

    fn window(start: &str, end: &str) -> TimeRange {
        TimeRange::new(ts(start), ts(end)).expect("window")
    }

    fn unix(value: &str) -> i64 {
        ts(value).unix_timestamp()
    }

    #[test]
    fn empty_cache_yields_the_whole_window() {
        let ranges: Vec<_> = GapIter::new(
            Interval::FifteenMinutes,
            window("2026-03-02T00:00:00Z", "2026-03-02T02:00:00Z"),
            Vec::new(),
        )
        .collect();

        assert_eq!(
            ranges,
            vec![window("2026-03-02T00:00:00Z", "2026-03-02T02:00:00Z")]
        );
    }

    #[test]
    fn splits_around_cached_points() {
        let cached = vec![
            unix("2026-03-02T00:15:00Z"),
            unix("2026-03-02T00:30:00Z"),
            unix("2026-03-02T01:30:00Z"),
        ];
        let ranges: Vec<_> = GapIter::new(
            Interval::FifteenMinutes,
            window("2026-03-02T00:00:00Z", "2026-03-02T02:00:00Z"),
            cached,
        )
        .collect();

        assert_eq!(
            ranges,
            vec![
                window("2026-03-02T00:00:00Z", "2026-03-02T00:15:00Z"),
                window("2026-03-02T00:45:00Z", "2026-03-02T01:30:00Z"),
                window("2026-03-02T01:45:00Z", "2026-03-02T02:00:00Z"),
            ]
        );
    }

    #[test]
    fn fully_cached_window_is_empty() {
        let cached = (0..4).map(|i| unix("2026-03-02T00:00:00Z") + i * 1_800).collect();
        let mut gaps = GapIter::new(
            Interval::ThirtyMinutes,
            window("2026-03-02T00:00:00Z", "2026-03-02T02:00:00Z"),
            cached,
        );
        assert_eq!(gaps.next(), None);
    }

    #[test]
    fn unaligned_window_starts_on_the_next_grid_point() {
        let ranges: Vec<_> = GapIter::new(
            Interval::OneHour,
            window("2026-03-02T00:20:00Z", "2026-03-02T02:00:00Z"),
            Vec::new(),
        )
        .collect();

        assert_eq!(
            ranges,
            vec![window("2026-03-02T01:00:00Z", "2026-03-02T02:00:00Z")]
        );
    }

    #[test]
    fn clones_restart_from_the_same_point() {
        let gaps = GapIter::new(
            Interval::FifteenMinutes,
            window("2026-03-02T00:00:00Z", "2026-03-02T01:00:00Z"),
            vec![unix("2026-03-02T00:30:00Z")],
        );
        let first: Vec<_> = gaps.clone().collect();
        let second: Vec<_> = gaps.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn gap_at_the_end_of_the_calendar_is_still_reported() {
        let range = window("9999-12-31T00:00:00Z", "9999-12-31T12:00:00Z");

        let ranges: Vec<_> = GapIter::new(Interval::OneDay, range, Vec::new()).collect();

        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start, range.start);
        assert!(ranges[0].end >= range.end);
    }

    #[test]
    fn grid_len_counts_points_in_the_half_open_window() {
        let range = window("2026-03-02T00:00:00Z", "2026-03-02T02:00:00Z");
        assert_eq!(range.grid_len(Interval::FifteenMinutes), 8);
        assert_eq!(range.grid_len(Interval::OneDay), 1);
    }

    #[test]
    fn rejects_inverted_window() {
        let err = TimeRange::new(ts("2026-03-02T02:00:00Z"), ts("2026-03-02T00:00:00Z"))
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidRange { .. }));
    }
}
