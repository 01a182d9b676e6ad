use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// RFC3339 timestamp guaranteed to be UTC, truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(truncate(OffsetDateTime::now_utc()))
    }

    /// Strict parse: the input must carry the `Z` offset.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input.trim(), &Rfc3339).map_err(|_| {
            ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            }
        })?;

        Self::from_offset_datetime(parsed).map_err(|_| ValidationError::TimestampNotUtc {
            value: input.to_owned(),
        })
    }

    /// Lenient parse used at the provider boundary: any RFC3339 offset is
    /// accepted and converted to UTC.
    pub fn parse_any_offset(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input.trim(), &Rfc3339).map_err(|_| {
            ValidationError::InvalidTimestamp {
                value: input.to_owned(),
            }
        })?;
        Ok(Self(truncate(parsed.to_offset(UtcOffset::UTC))))
    }

    pub fn from_offset_datetime(value: OffsetDateTime) -> Result<Self, ValidationError> {
        if value.offset() != UtcOffset::UTC {
            return Err(ValidationError::TimestampNotUtc {
                value: value
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| String::from("<unformattable>")),
            });
        }

        Ok(Self(truncate(value)))
    }

    pub fn from_unix(seconds: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(Self)
            .map_err(|_| ValidationError::InvalidTimestamp {
                value: seconds.to_string(),
            })
    }

    /// Parse the `YYYY-MM-DD HH:MM:SS` form used by the warehouse.
    pub fn from_sql(value: &str) -> Result<Self, ValidationError> {
        let rfc3339 = format!("{}Z", value.trim().replacen(' ', "T", 1));
        Self::parse(&rfc3339).map_err(|_| ValidationError::InvalidTimestamp {
            value: value.to_owned(),
        })
    }

    pub fn unix_timestamp(self) -> i64 {
        self.0.unix_timestamp()
    }

    pub fn saturating_sub_days(self, days: u32) -> Self {
        Self(self.0.saturating_sub(Duration::days(i64::from(days))))
    }

    pub fn saturating_sub_hours(self, hours: u32) -> Self {
        Self(self.0.saturating_sub(Duration::hours(i64::from(hours))))
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn format_rfc3339(self) -> String {
        // Years outside 0..=9999 are not RFC3339.
        self.0.format(&Rfc3339).unwrap_or_else(|_| self.to_sql())
    }

    /// `YYYY-MM-DD HH:MM:SS`, the layout stored in DuckDB `TIMESTAMP` columns.
    pub fn to_sql(self) -> String {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

fn truncate(value: OffsetDateTime) -> OffsetDateTime {
    value.replace_nanosecond(0).unwrap_or(value)
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_timestamp() {
        let parsed = UtcDateTime::parse("2024-01-01T00:00:00Z").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn rejects_non_utc_timestamp() {
        let err = UtcDateTime::parse("2024-01-01T01:00:00+01:00").expect_err("must fail");
        assert!(matches!(err, ValidationError::TimestampNotUtc { .. }));
    }

    #[test]
    fn lenient_parse_converts_offsets() {
        let parsed = UtcDateTime::parse_any_offset("2024-01-01T01:30:00+01:00").expect("parse");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T00:30:00Z");
    }

    #[test]
    fn sql_form_roundtrips_and_drops_subseconds() {
        let parsed = UtcDateTime::parse("2024-03-05T07:08:09.750Z").expect("parse");
        assert_eq!(parsed.to_sql(), "2024-03-05 07:08:09");
        assert_eq!(UtcDateTime::from_sql("2024-03-05 07:08:09").expect("sql"), parsed);
    }

    #[test]
    fn unix_conversion() {
        let parsed = UtcDateTime::from_unix(1_704_067_200).expect("unix");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T00:00:00Z");
        assert_eq!(parsed.saturating_sub_days(1).to_sql(), "2023-12-31 00:00:00");
    }
}
