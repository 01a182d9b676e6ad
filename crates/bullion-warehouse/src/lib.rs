//! # Bullion Warehouse
//!
//! DuckDB-backed record store for the bullion cache.
//!
//! The warehouse owns every persisted row: cached price bars, news items,
//! the fetch audit trail and the recommendation ledger. Callers hand it
//! plain records; all SQL is parameterized and each unit of work (a bar
//! sub-range, one news item) runs in its own transaction.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bullion_warehouse::{Warehouse, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open(WarehouseConfig::default())?;
//!     for bar in warehouse.latest_bars("15m", 5)? {
//!         println!("{} close={}", bar.ts, bar.close);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `price_bars` | OHLCV bars keyed by (interval, timestamp) |
//! | `news_items` | Deduplicated news keyed by content fingerprint |
//! | `fetch_audit` | Append-only provider fetch history |
//! | `recommendations` | Append-only recommendation ledger |
//!
//! Timestamps cross this boundary as `YYYY-MM-DD HH:MM:SS` strings in UTC.

pub mod duckdb;
pub mod ledger;
pub mod migrations;
pub mod news;
pub mod prices;
pub mod records;
pub mod sentiment;
pub mod views;

use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::Connection;
use thiserror::Error;
use tracing::warn;

pub use duckdb::{DuckDbConnectionManager, PooledConnection};
pub use news::{NewsQuery, NewsWrite};
pub use prices::{MergeMode, MergeOutcome};
pub use records::{
    CategoryCount, CategorySentiment, DailySentiment, FetchAuditRecord, NewsRecord, NewsSummary,
    PriceBarRecord, PriceCacheSummary, PublisherCount, PublisherSentiment, RecommendationRecord,
    ScoredKeywords, StoredFetchAudit, StoredRecommendation,
};

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Stored keyword list could not be encoded or decoded.
    #[error("keyword encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A transactional unit failed and was rolled back.
    #[error("{unit} rolled back: {message}")]
    Integrity { unit: String, message: String },

    /// Request was rejected before touching the database.
    #[error("query rejected: {0}")]
    QueryRejected(String),
}

impl WarehouseError {
    fn integrity(unit: impl Into<String>, cause: impl Display) -> Self {
        Self::Integrity {
            unit: unit.into(),
            message: cause.to_string(),
        }
    }
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for bullion data.
    pub bullion_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let bullion_home = resolve_bullion_home();
        let db_path = bullion_home.join("cache").join("bullion.duckdb");
        Self {
            bullion_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// The record store for cached market data and ledgers.
#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    /// Open a warehouse with the specified configuration, creating the
    /// database file and schema when missing.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = DuckDbConnectionManager::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { manager };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Initialize database schema and views.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    fn connection(&self) -> Result<PooledConnection, WarehouseError> {
        Ok(self.manager.acquire()?)
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = connection.execute_batch("ROLLBACK") {
                warn!(error = %rollback_error, "rollback failed");
            }
            Err(error)
        }
    }
}

fn ensure_limit(limit: usize) -> Result<(), WarehouseError> {
    if limit == 0 {
        return Err(WarehouseError::QueryRejected(String::from(
            "limit must be greater than zero",
        )));
    }
    Ok(())
}

/// Resolve the bullion home directory from environment or default.
fn resolve_bullion_home() -> PathBuf {
    if let Some(path) = env::var_os("BULLION_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".bullion");
    }

    PathBuf::from(".bullion")
}
