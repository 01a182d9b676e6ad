mod audit;
mod config;
mod news;
mod prices;
mod recommendations;

use std::sync::Arc;
use std::time::Instant;

use bullion_core::{
    BullionConfig, Envelope, EnvelopeError, EnvelopeMeta, Interval, NewsSource, PriceSource,
    ProviderId, SimulatedAdapter, SourceError, UtcDateTime, Warehouse, YahooAdapter,
};
use serde_json::Value;
use uuid::Uuid;

use crate::cli::{Cli, Command, WindowArgs};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    /// Set when the command talked to a provider.
    pub provider: Option<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

pub fn run(cli: &Cli, config: &BullionConfig) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let open = || Warehouse::open(config.warehouse.clone());
    let command_result = match &cli.command {
        Command::Prices(args) => prices::run(args, config, open()?)?,
        Command::News(args) => news::run(args, config, open()?)?,
        Command::Recommendations(args) => recommendations::run(args, open()?)?,
        Command::Audit(args) => audit::run(args, open()?)?,
        Command::Config => config::run(config)?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        provider,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(Uuid::new_v4().to_string(), provider, latency_ms)?;
    for warning in config.warnings().into_iter().chain(warnings) {
        meta.push_warning(warning);
    }

    Envelope::with_errors(meta, data, errors).map_err(CliError::from)
}

fn price_source(config: &BullionConfig) -> Result<Arc<dyn PriceSource>, CliError> {
    Ok(match config.provider {
        ProviderId::Simulated => Arc::new(SimulatedAdapter::default()),
        ProviderId::Yahoo => Arc::new(YahooAdapter::new(config.request_timeout)?),
        ProviderId::Scripted => return Err(scripted_unavailable()),
    })
}

fn news_source(config: &BullionConfig) -> Result<Arc<dyn NewsSource>, CliError> {
    Ok(match config.provider {
        ProviderId::Simulated => Arc::new(SimulatedAdapter::default()),
        ProviderId::Yahoo => Arc::new(YahooAdapter::new(config.request_timeout)?),
        ProviderId::Scripted => return Err(scripted_unavailable()),
    })
}

fn scripted_unavailable() -> CliError {
    CliError::Provider(SourceError::invalid_request(
        "the scripted provider is not available from the command line",
    ))
}

/// `[start, end)` from explicit bounds, or the trailing `days` ending at the
/// latest completed grid point of `interval`.
fn resolve_window(
    window: &WindowArgs,
    interval: Interval,
    default_days: u32,
) -> Result<(UtcDateTime, UtcDateTime), CliError> {
    if let (Some(start), Some(end)) = (&window.start, &window.end) {
        return Ok((
            UtcDateTime::parse_any_offset(start)?,
            UtcDateTime::parse_any_offset(end)?,
        ));
    }

    let end = interval.floor(UtcDateTime::now())?;
    let days = window.days.unwrap_or(default_days);
    Ok((end.saturating_sub_days(days), end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::{tempdir, TempDir};

    fn offline_config() -> (TempDir, BullionConfig) {
        let temp = tempdir().expect("tempdir");
        let home = temp.path().to_string_lossy().into_owned();
        let config = BullionConfig::from_lookup(|key| match key {
            "BULLION_HOME" => Some(home.clone()),
            "BULLION_PROVIDER" => Some(String::from("simulated")),
            "BULLION_API_DELAY_MS" => Some(String::from("0")),
            _ => None,
        })
        .expect("config");
        (temp, config)
    }

    fn invoke(config: &BullionConfig, args: &[&str]) -> Envelope<Value> {
        let cli = Cli::try_parse_from(std::iter::once("bullion").chain(args.iter().copied()))
            .expect("parse");
        run(&cli, config).expect("command")
    }

    // =========================================================================
    // User Journeys
    // =========================================================================

    #[test]
    fn when_user_syncs_twice_the_second_run_fetches_nothing() {
        // Given: An empty cache and the offline provider
        let (_temp, config) = offline_config();
        let sync = [
            "prices",
            "sync",
            "--interval",
            "1h",
            "--start",
            "2026-03-02T00:00:00Z",
            "--end",
            "2026-03-02T06:00:00Z",
        ];

        // When: The same window is synced twice
        let first = invoke(&config, &sync);
        let second = invoke(&config, &sync);

        // Then: Only the first run adds bars
        assert!(first.errors.is_empty());
        assert_eq!(first.meta.provider, Some(ProviderId::Simulated));
        assert_eq!(first.data[0]["bars_added"], 6);
        assert_eq!(second.data[0]["bars_added"], 0);
        assert_eq!(second.data[0]["ranges_fetched"], 0);

        // And: The cached bars are readable
        let latest = invoke(&config, &["prices", "latest", "--interval", "1h", "--limit", "3"]);
        assert_eq!(latest.data.as_array().map(Vec::len), Some(3));
        assert_eq!(latest.meta.provider, None);
    }

    #[test]
    fn when_user_ingests_overlapping_symbols_shared_stories_are_stored_once() {
        let (_temp, config) = offline_config();

        let envelope = invoke(
            &config,
            &["news", "ingest", "--symbol", "GLD", "--symbol", "IAU", "--max", "5"],
        );

        let added = envelope.data["items_added"].as_u64().expect("added");
        let duplicates = envelope.data["items_skipped_duplicate"]
            .as_u64()
            .expect("duplicates");
        assert_eq!(added + duplicates, 10);
        assert!(duplicates > 0);

        let listed = invoke(&config, &["news", "list", "--limit", "50"]);
        assert_eq!(listed.data.as_array().map(Vec::len), Some(added as usize));
    }

    #[test]
    fn when_user_records_a_recommendation_it_is_listed() {
        let (_temp, config) = offline_config();

        invoke(
            &config,
            &["recommendations", "record", "HOLD above 2000", "--price", "2041.5"],
        );
        let listed = invoke(&config, &["recommendations", "list"]);

        assert_eq!(listed.data.as_array().map(Vec::len), Some(1));
        assert_eq!(listed.data[0]["recommendation_text"], "HOLD above 2000");
        assert_eq!(listed.data[0]["succeeded"], true);
    }

    #[test]
    fn when_user_analyzes_ingested_news_categories_and_keywords_are_reported() {
        // Given: News ingested from the offline provider
        let (_temp, config) = offline_config();
        invoke(&config, &["news", "ingest", "--symbol", "GLD", "--max", "5"]);

        // When: The analyses run over a window covering every article
        let categories = invoke(&config, &["news", "categories", "--days", "36500"]);
        let keywords = invoke(&config, &["news", "keywords", "--days", "36500", "--top", "3"]);

        // Then: Both report structured results
        assert!(categories.data["categories"].as_array().is_some_and(|rows| !rows.is_empty()));
        assert!(categories.data["most_covered"].is_string());
        let top = keywords.data["top_keywords"].as_array().expect("keywords");
        assert!(!top.is_empty() && top.len() <= 3);
    }

    #[test]
    fn when_cache_is_empty_the_trend_is_null_with_a_warning() {
        let (_temp, config) = offline_config();

        let trend = invoke(&config, &["news", "trend", "--days", "3"]);

        assert!(trend.data.is_null());
        assert!(trend
            .meta
            .warnings
            .iter()
            .any(|warning| warning.contains("last 3 day(s)")));
    }

    // =========================================================================
    // Window Resolution
    // =========================================================================

    #[test]
    fn explicit_window_wins_over_days() {
        let window = WindowArgs {
            days: None,
            start: Some(String::from("2026-03-02T01:00:00+01:00")),
            end: Some(String::from("2026-03-02T06:00:00Z")),
        };

        let (start, end) = resolve_window(&window, Interval::OneHour, 7).expect("window");

        assert_eq!(start, UtcDateTime::parse("2026-03-02T00:00:00Z").expect("ts"));
        assert_eq!(end, UtcDateTime::parse("2026-03-02T06:00:00Z").expect("ts"));
    }

    #[test]
    fn trailing_window_ends_on_the_grid() {
        let window = WindowArgs {
            days: Some(2),
            start: None,
            end: None,
        };

        let (start, end) = resolve_window(&window, Interval::FifteenMinutes, 7).expect("window");

        assert_eq!(end.unix_timestamp() % Interval::FifteenMinutes.step_seconds(), 0);
        assert_eq!(end.unix_timestamp() - start.unix_timestamp(), 2 * 86_400);
    }
}
