use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::{Interval, Symbol, UtcDateTime};

/// Why a unit of work failed. Rendered as the prefix of `error_detail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    ProviderTransient,
    ProviderRateLimit,
    ProviderRejected,
    StoreIntegrity,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ProviderTransient => "provider_transient",
            Self::ProviderRateLimit => "provider_rate_limit",
            Self::ProviderRejected => "provider_rejected",
            Self::StoreIntegrity => "store_integrity",
        }
    }

    pub fn detail(self, message: impl Display) -> String {
        format!("{}: {message}", self.as_str())
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a fetch attempt was for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuditTarget {
    Price(Interval),
    News(Symbol),
}

impl Display for AuditTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Price(interval) => write!(f, "price:{interval}"),
            Self::News(symbol) => write!(f, "news:{symbol}"),
        }
    }
}

/// One entry of the fetch audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchAuditEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub target: String,
    pub range_start: Option<UtcDateTime>,
    pub range_end: Option<UtcDateTime>,
    pub fetched_count: u64,
    pub succeeded: bool,
    pub error_detail: Option<String>,
    pub occurred_at: UtcDateTime,
}

impl FetchAuditEntry {
    pub fn success(target: &AuditTarget, fetched_count: u64) -> Self {
        Self {
            id: None,
            target: target.to_string(),
            range_start: None,
            range_end: None,
            fetched_count,
            succeeded: true,
            error_detail: None,
            occurred_at: UtcDateTime::now(),
        }
    }

    pub fn failure(target: &AuditTarget, kind: FailureKind, message: impl Display) -> Self {
        Self {
            succeeded: false,
            error_detail: Some(kind.detail(message)),
            ..Self::success(target, 0)
        }
    }

    pub fn with_range(mut self, start: UtcDateTime, end: UtcDateTime) -> Self {
        self.range_start = Some(start);
        self.range_end = Some(end);
        self
    }

    pub fn with_fetched_count(mut self, fetched_count: u64) -> Self {
        self.fetched_count = fetched_count;
        self
    }

    /// Failure kind parsed back from `error_detail`.
    pub fn failure_kind(&self) -> Option<&str> {
        self.error_detail
            .as_deref()
            .and_then(|detail| detail.split_once(':'))
            .map(|(kind, _)| kind)
    }
}
