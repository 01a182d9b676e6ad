//! # Bullion Core
//!
//! Caching core for gold and commodity market data.
//!
//! ## Overview
//!
//! This crate keeps a local copy of provider data fresh without ever
//! fetching the same thing twice:
//!
//! - **Gap detection** over an epoch-aligned bar grid
//! - **Incremental price sync** that fetches only missing sub-ranges, with
//!   pacing, retry and a fetch audit trail
//! - **News ingestion** with content fingerprints, sentiment, category and
//!   keyword enrichment
//! - **Recommendation ledger** for analysis output and its inputs
//! - **Read views** over everything cached
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Simulated, Yahoo and scripted providers |
//! | [`config`] | Environment-driven runtime settings |
//! | [`data_source`] | Provider traits and request types |
//! | [`domain`] | Validated domain types |
//! | [`envelope`] | Response envelope for CLI output |
//! | [`error`] | Validation and core errors |
//! | [`gaps`] | Missing grid point detection |
//! | [`ledger`] | Recommendation ledger |
//! | [`news`] | News dedup and enrichment engine |
//! | [`reader`] | Read-side queries |
//! | [`retry`] | Retry with fixed or exponential backoff |
//! | [`source`] | Provider identifiers |
//! | [`sync`] | Price sync engine |
//! | [`throttling`] | Minimum spacing between provider calls |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bullion_core::{BullionConfig, Interval, PriceSyncEngine, SimulatedAdapter, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BullionConfig::from_env()?;
//!     let warehouse = Warehouse::open(config.warehouse.clone())?;
//!     let engine = PriceSyncEngine::new(
//!         warehouse,
//!         Arc::new(SimulatedAdapter::default()),
//!         config.sync_config(),
//!     );
//!
//!     let report = engine.sync_recent(Interval::FifteenMinutes, 2)?;
//!     println!("added {} bars", report.bars_added);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │ PriceSyncEngine │────▶│  GapDetector     │
//! │ NewsEngine      │     └──────────────────┘
//! └────────┬────────┘
//!          │  CallPacer + call_with_retry
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ PriceSource /   │     │ Warehouse        │
//! │ NewsSource      │     │ (DuckDB)         │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod gaps;
pub mod ledger;
pub mod news;
pub mod reader;
pub mod retry;
pub mod source;
pub mod sync;
pub mod throttling;

mod records;

pub use adapters::{ScriptedNewsSource, ScriptedPriceSource, SimulatedAdapter, YahooAdapter};
pub use config::{BackoffMode, BullionConfig, ConfigError, ConfigSummary};
pub use data_source::{
    ArticlesRequest, BarsRequest, NewsSource, PriceSource, SourceError, SourceErrorKind,
};
pub use domain::{
    AuditTarget, CachedBar, FailureKind, FetchAuditEntry, Interval, NewsCandidate, NewsCategory,
    NewsItem, PriceBar, RawArticle, RawBar, RawTimestamp, Recommendation, SentimentLabel,
    StoredRecommendation, Symbol, UtcDateTime, UNKNOWN_PUBLISHER,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{CoreError, ValidationError};
pub use gaps::{GapDetector, GapIter, TimeRange};
pub use ledger::RecommendationLedger;
pub use news::{
    CategoryAnalysis, CategoryStats, Enrichment, IngestReport, KeywordAnalysis, KeywordSignal,
    KeywordStats, MarketImpact, NewsConfig, NewsEngine, PublisherAnalysis, PublisherBias,
    PublisherReliability, PublisherStats, SentimentTrend, TrendDirection,
};
pub use reader::{CacheReader, NewsFilter};
pub use retry::{call_with_retry, Backoff, RetryConfig, RetryOutcome};
pub use source::ProviderId;
pub use sync::{FetchMode, PriceSyncEngine, SyncConfig, SyncReport};
pub use throttling::CallPacer;

pub use bullion_warehouse::{
    CategoryCount, DailySentiment, NewsSummary, PriceCacheSummary, PublisherCount, Warehouse,
    WarehouseConfig, WarehouseError,
};
