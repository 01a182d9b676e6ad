//! Environment-driven configuration.
//!
//! Every setting has a default; `BULLION_*` variables override them. The
//! resolved value is threaded explicitly into each engine.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use bullion_warehouse::WarehouseConfig;

use crate::news::NewsConfig;
use crate::sync::SyncConfig;
use crate::{Backoff, Interval, ProviderId, RetryConfig, Symbol};

const DEFAULT_PRICE_SYMBOL: &str = "GC=F";
const DEFAULT_NEWS_SYMBOLS: &str = "GC=F,GLD,IAU,GOLD";
const DEFAULT_INTERVALS: &str = "15m,30m";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}='{value}' is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// How the delay between retries grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffMode {
    Fixed,
    /// Doubles per retry with jitter, capped at `BULLION_RETRY_MAX_DELAY_MS`.
    Exponential,
}

impl FromStr for BackoffMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "exponential" => Ok(Self::Exponential),
            _ => Err(String::from("expected fixed or exponential")),
        }
    }
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Display) -> Self {
        Self::Invalid {
            key,
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct BullionConfig {
    pub warehouse: WarehouseConfig,
    pub provider: ProviderId,
    pub price_symbol: Symbol,
    pub news_symbols: Vec<Symbol>,
    pub intervals: Vec<Interval>,
    pub max_articles: usize,
    pub fetch_days: u32,
    pub call_delay: Duration,
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    pub keyword_limit: usize,
    pub enable_sentiment: bool,
}

impl BullionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let bullion_home = get("BULLION_HOME")
            .map(PathBuf::from)
            .or_else(|| get("HOME").map(|home| PathBuf::from(home).join(".bullion")))
            .unwrap_or_else(|| PathBuf::from(".bullion"));
        let db_path = get("BULLION_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| bullion_home.join("cache").join("bullion.duckdb"));

        let max_retries = parsed(&get, "BULLION_MAX_RETRIES", 3u32)?;
        let retry_delay = millis(&get, "BULLION_RETRY_DELAY_MS", 1_000)?;
        let retry_max_delay = millis(&get, "BULLION_RETRY_MAX_DELAY_MS", 30_000)?;
        if retry_max_delay < retry_delay {
            return Err(ConfigError::invalid(
                "BULLION_RETRY_MAX_DELAY_MS",
                &retry_max_delay.as_millis().to_string(),
                "must not be below BULLION_RETRY_DELAY_MS",
            ));
        }
        let retry = match parsed(&get, "BULLION_RETRY_BACKOFF", BackoffMode::Fixed)? {
            BackoffMode::Fixed => RetryConfig::fixed(retry_delay, max_retries),
            BackoffMode::Exponential => {
                RetryConfig::exponential(max_retries, retry_delay, retry_max_delay)
            }
        };

        Ok(Self {
            warehouse: WarehouseConfig {
                bullion_home,
                db_path,
                max_pool_size: parsed(&get, "BULLION_POOL_SIZE", 4usize)?,
            },
            provider: parsed(&get, "BULLION_PROVIDER", ProviderId::Simulated)?,
            price_symbol: single(&get, "BULLION_PRICE_SYMBOL", DEFAULT_PRICE_SYMBOL)?,
            news_symbols: list(&get, "BULLION_NEWS_SYMBOLS", DEFAULT_NEWS_SYMBOLS)?,
            intervals: list(&get, "BULLION_INTERVALS", DEFAULT_INTERVALS)?,
            max_articles: positive(&get, "BULLION_MAX_ARTICLES", 50)?,
            fetch_days: parsed(&get, "BULLION_FETCH_DAYS", 14u32)?,
            call_delay: millis(&get, "BULLION_API_DELAY_MS", 1_000)?,
            retry,
            request_timeout: millis(&get, "BULLION_TIMEOUT_MS", 30_000)?,
            keyword_limit: parsed(&get, "BULLION_KEYWORD_LIMIT", 8usize)?,
            enable_sentiment: boolean(&get, "BULLION_ENABLE_SENTIMENT", true)?,
        })
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            symbol: self.price_symbol.clone(),
            retry: self.retry.clone(),
            call_delay: self.call_delay,
        }
    }

    pub fn news_config(&self) -> NewsConfig {
        NewsConfig {
            retry: self.retry.clone(),
            call_delay: self.call_delay,
            keyword_limit: self.keyword_limit,
            enable_sentiment: self.enable_sentiment,
            ..NewsConfig::default()
        }
    }

    /// Settings that are valid but likely to cause trouble.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.provider == ProviderId::Yahoo && self.call_delay < Duration::from_millis(500) {
            warnings.push(String::from(
                "BULLION_API_DELAY_MS below 500ms is likely to trip provider rate limits",
            ));
        }
        if self.max_articles > 100 {
            warnings.push(String::from(
                "BULLION_MAX_ARTICLES above 100 exceeds what news providers usually return",
            ));
        }
        if self.retry.max_retries == 0 {
            warnings.push(String::from(
                "BULLION_MAX_RETRIES is 0; transient failures are not retried",
            ));
        }
        let intraday = self
            .intervals
            .iter()
            .any(|interval| interval.step_seconds() < Interval::OneDay.step_seconds());
        if intraday && self.fetch_days > 60 {
            warnings.push(String::from(
                "intraday history is usually limited to 60 days; older ranges will stay missing",
            ));
        }
        if !self.enable_sentiment {
            warnings.push(String::from("sentiment scoring is disabled"));
        }
        warnings
    }

    pub fn summary(&self) -> ConfigSummary {
        let (retry_backoff, retry_delay, retry_max_delay) = match self.retry.backoff {
            Backoff::Fixed { delay } => (BackoffMode::Fixed, delay, delay),
            Backoff::Exponential { base, max, .. } => (BackoffMode::Exponential, base, max),
        };
        ConfigSummary {
            bullion_home: self.warehouse.bullion_home.display().to_string(),
            db_path: self.warehouse.db_path.display().to_string(),
            pool_size: self.warehouse.max_pool_size,
            provider: self.provider,
            price_symbol: self.price_symbol.clone(),
            news_symbols: self.news_symbols.clone(),
            intervals: self.intervals.clone(),
            max_articles: self.max_articles,
            fetch_days: self.fetch_days,
            api_delay_ms: duration_ms(self.call_delay),
            max_retries: self.retry.max_retries,
            retry_backoff,
            retry_delay_ms: duration_ms(retry_delay),
            retry_max_delay_ms: duration_ms(retry_max_delay),
            timeout_ms: duration_ms(self.request_timeout),
            keyword_limit: self.keyword_limit,
            enable_sentiment: self.enable_sentiment,
            warnings: self.warnings(),
        }
    }
}

/// Printable view of [`BullionConfig`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSummary {
    pub bullion_home: String,
    pub db_path: String,
    pub pool_size: usize,
    pub provider: ProviderId,
    pub price_symbol: Symbol,
    pub news_symbols: Vec<Symbol>,
    pub intervals: Vec<Interval>,
    pub max_articles: usize,
    pub fetch_days: u32,
    pub api_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff: BackoffMode,
    pub retry_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub timeout_ms: u64,
    pub keyword_limit: usize,
    pub enable_sentiment: bool,
    pub warnings: Vec<String>,
}

fn duration_ms(value: Duration) -> u64 {
    u64::try_from(value.as_millis()).unwrap_or(u64::MAX)
}

fn parsed<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        Some(value) => value
            .parse()
            .map_err(|error| ConfigError::invalid(key, &value, error)),
        None => Ok(default),
    }
}

fn single<G, T>(get: &G, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = get(key).unwrap_or_else(|| default.to_owned());
    raw.parse()
        .map_err(|error| ConfigError::invalid(key, &raw, error))
}

fn positive<G>(get: &G, key: &'static str, default: usize) -> Result<usize, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value: usize = parsed(get, key, default)?;
    if value == 0 {
        return Err(ConfigError::invalid(key, "0", "must be greater than zero"));
    }
    Ok(value)
}

fn millis<G>(get: &G, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    parsed(get, key, default).map(Duration::from_millis)
}

fn boolean<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(value) = get(key) else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, &value, "expected true or false")),
    }
}

fn list<G, T>(get: &G, key: &'static str, default: &str) -> Result<Vec<T>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = get(key).unwrap_or_else(|| default.to_owned());
    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse()
                .map_err(|error| ConfigError::invalid(key, item, error))
        })
        .collect::<Result<Vec<T>, _>>()?;
    if values.is_empty() {
        return Err(ConfigError::invalid(key, &raw, "list must not be empty"));
    }
    Ok(values)
}
