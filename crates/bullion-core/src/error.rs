use thiserror::Error;

use bullion_warehouse::WarehouseError;

use crate::config::ConfigError;

/// Validation errors raised at the ingestion boundary and by argument checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 1m, 5m, 15m, 30m, 1h, 1d")]
    InvalidInterval { value: String },
    #[error("invalid provider '{value}', expected one of simulated, yahoo")]
    InvalidSource { value: String },
    #[error("invalid news category '{value}'")]
    InvalidCategory { value: String },
    #[error("invalid sentiment label '{value}', expected positive, neutral or negative")]
    InvalidSentimentLabel { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("unparseable timestamp: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("timestamp {ts} is not aligned to the {interval} grid")]
    MisalignedTimestamp { ts: String, interval: String },
    #[error("range start {start} must be before end {end}")]
    InvalidRange { start: String, end: String },

    #[error("field '{field}' is missing")]
    MissingField { field: &'static str },
    #[error("field '{field}' must not be blank")]
    BlankField { field: &'static str },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("bar open/close must be within high/low range")]
    InvalidBarBounds,

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Top-level error type for core operations.
///
/// Per-unit failures during a sync or ingest never surface here; they are
/// audited and counted in the operation's report instead.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
