use std::fmt::{Display, Formatter};

use crate::{Interval, ProviderId, RawArticle, RawBar, Symbol, UtcDateTime};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Network failure, timeout or 5xx: worth retrying.
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn is_rate_limited(&self) -> bool {
        matches!(self.kind, SourceErrorKind::RateLimited)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Half-open bar window `[start, end)` for one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarsRequest {
    pub symbol: Symbol,
    pub interval: Interval,
    pub start: UtcDateTime,
    pub end: UtcDateTime,
}

impl BarsRequest {
    pub fn new(
        symbol: Symbol,
        interval: Interval,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<Self, SourceError> {
        if start >= end {
            return Err(SourceError::invalid_request(format!(
                "bars request start {start} must be before end {end}"
            )));
        }
        Ok(Self {
            symbol,
            interval,
            start,
            end,
        })
    }
}

/// Request for up to `limit` recent articles about a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlesRequest {
    pub symbol: Symbol,
    pub limit: usize,
}

impl ArticlesRequest {
    pub fn new(symbol: Symbol, limit: usize) -> Result<Self, SourceError> {
        if limit == 0 {
            return Err(SourceError::invalid_request(
                "articles request limit must be greater than zero",
            ));
        }
        Ok(Self { symbol, limit })
    }
}

/// External price provider.
///
/// May return fewer bars than the window holds (market closed) and bars in
/// any order; the sync engine validates and deduplicates.
pub trait PriceSource: Send + Sync {
    fn id(&self) -> ProviderId;
    fn fetch_bars(&self, req: &BarsRequest) -> Result<Vec<RawBar>, SourceError>;
}

/// External news provider.
pub trait NewsSource: Send + Sync {
    fn id(&self) -> ProviderId;
    fn fetch_articles(&self, req: &ArticlesRequest) -> Result<Vec<RawArticle>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_are_retryable_but_rejections_are_not() {
        assert!(SourceError::rate_limited("429").retryable());
        assert!(SourceError::unavailable("timeout").retryable());
        assert!(!SourceError::invalid_request("bad symbol").retryable());
        assert_eq!(SourceError::internal("decode").code(), "source.internal");
    }

    #[test]
    fn bars_request_rejects_empty_window() {
        let ts = UtcDateTime::parse("2026-03-02T00:00:00Z").expect("ts");
        let symbol = Symbol::parse("GC=F").expect("symbol");
        let err = BarsRequest::new(symbol, Interval::FifteenMinutes, ts, ts).expect_err("empty");
        assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);
    }
}
