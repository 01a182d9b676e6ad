use serde::{Deserialize, Serialize};

use crate::{Interval, UtcDateTime, ValidationError};

/// Loosely-typed bar as handed over by a price provider.
///
/// Every field is optional; [`PriceBar::from_raw`] is the only way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// Unix seconds.
    pub timestamp: Option<i64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

impl RawBar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }
}

/// Validated OHLCV bar on an interval grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub ts: UtcDateTime,
    pub interval: Interval,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(
        ts: UtcDateTime,
        interval: Interval,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        if !interval.is_aligned(ts) {
            return Err(ValidationError::MisalignedTimestamp {
                ts: ts.format_rfc3339(),
                interval: interval.to_string(),
            });
        }

        Ok(Self {
            ts,
            interval,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn from_raw(raw: &RawBar, interval: Interval) -> Result<Self, ValidationError> {
        let timestamp = require(raw.timestamp, "timestamp")?;
        let volume = require(raw.volume, "volume")?;
        let volume =
            u64::try_from(volume).map_err(|_| ValidationError::NegativeValue { field: "volume" })?;

        Self::new(
            UtcDateTime::from_unix(timestamp)?,
            interval,
            require(raw.open, "open")?,
            require(raw.high, "high")?,
            require(raw.low, "low")?,
            require(raw.close, "close")?,
            volume,
        )
    }
}

/// A bar read back from the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedBar {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub cached_at: UtcDateTime,
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField { field })
}

pub(crate) fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
