use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// Supported bar intervals. Grid points are aligned to the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    pub const ALL: [Self; 6] = [
        Self::OneMinute,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::OneDay,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
        }
    }

    /// Length of one grid step in seconds.
    pub const fn step_seconds(self) -> i64 {
        match self {
            Self::OneMinute => 60,
            Self::FiveMinutes => 300,
            Self::FifteenMinutes => 900,
            Self::ThirtyMinutes => 1_800,
            Self::OneHour => 3_600,
            Self::OneDay => 86_400,
        }
    }

    /// Largest grid point `<= unix`.
    pub const fn align_down(self, unix: i64) -> i64 {
        unix - unix.rem_euclid(self.step_seconds())
    }

    /// Smallest grid point `>= unix`.
    pub const fn align_up(self, unix: i64) -> i64 {
        let remainder = unix.rem_euclid(self.step_seconds());
        if remainder == 0 {
            unix
        } else {
            unix + (self.step_seconds() - remainder)
        }
    }

    pub fn is_aligned(self, ts: UtcDateTime) -> bool {
        ts.unix_timestamp().rem_euclid(self.step_seconds()) == 0
    }

    pub fn floor(self, ts: UtcDateTime) -> Result<UtcDateTime, ValidationError> {
        UtcDateTime::from_unix(self.align_down(ts.unix_timestamp()))
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Self::OneMinute),
            "5m" => Ok(Self::FiveMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "30m" => Ok(Self::ThirtyMinutes),
            "1h" | "60m" => Ok(Self::OneHour),
            "1d" => Ok(Self::OneDay),
            other => Err(ValidationError::InvalidInterval {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interval() {
        let interval = Interval::from_str("30m").expect("must parse");
        assert_eq!(interval, Interval::ThirtyMinutes);
        assert_eq!(Interval::from_str("60m").expect("alias"), Interval::OneHour);
    }

    #[test]
    fn rejects_invalid_interval() {
        let err = Interval::from_str("2h").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidInterval { .. }));
    }

    #[test]
    fn aligns_to_epoch_grid() {
        let interval = Interval::FifteenMinutes;
        assert_eq!(interval.align_down(1_000), 900);
        assert_eq!(interval.align_up(1_000), 1_800);
        assert_eq!(interval.align_up(1_800), 1_800);
        assert_eq!(interval.align_down(-1), -900);

        let aligned = UtcDateTime::parse("2026-03-02T10:45:00Z").expect("ts");
        let misaligned = UtcDateTime::parse("2026-03-02T10:46:00Z").expect("ts");
        assert!(interval.is_aligned(aligned));
        assert!(!interval.is_aligned(misaligned));
        assert_eq!(interval.floor(misaligned).expect("floor"), aligned);
    }
}
