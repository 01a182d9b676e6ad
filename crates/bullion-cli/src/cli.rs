//! CLI argument definitions for bullion.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `prices` | Sync cached bars, inspect gaps, read bars |
//! | `news` | Ingest, list and search cached news |
//! | `recommendations` | Read or append the recommendation ledger |
//! | `audit` | Provider fetch history |
//! | `config` | Resolved configuration and warnings |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings and errors as failures |
//! | `--db-path` | `$BULLION_DB_PATH` | Override the database file |
//! | `--provider` | `$BULLION_PROVIDER` | Override the data provider |
//!
//! # Examples
//!
//! ```bash
//! bullion prices sync --interval 15m --days 2
//! bullion prices gaps --interval 1h --days 7 --format table
//! bullion news ingest --symbol GLD --symbol IAU --max 20
//! bullion news list --sentiment positive --days 3
//! bullion audit --target price: --limit 5
//! ```

use std::path::PathBuf;

use bullion_core::{Interval, NewsCategory, ProviderId, SentimentLabel, Symbol};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Incremental gold price and news cache.
#[derive(Debug, Parser)]
#[command(
    name = "bullion",
    version,
    about = "Incremental gold price and news cache",
    long_about = "bullion keeps a local DuckDB copy of commodity prices and news fresh \
without fetching the same bar or article twice.\n\
\n\
Use 'bullion <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Database file, overriding BULLION_DB_PATH.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Data provider, overriding BULLION_PROVIDER.
    #[arg(long, global = true, value_enum)]
    pub provider: Option<ProviderSelector>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminal display.
    Table,
    /// Single JSON object.
    Json,
    /// Metadata line followed by one JSON line per row.
    Ndjson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderSelector {
    /// Deterministic offline data.
    Simulated,
    /// Yahoo Finance.
    Yahoo,
}

impl From<ProviderSelector> for ProviderId {
    fn from(selector: ProviderSelector) -> Self {
        match selector {
            ProviderSelector::Simulated => Self::Simulated,
            ProviderSelector::Yahoo => Self::Yahoo,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price bar cache.
    Prices(PricesArgs),

    /// News cache.
    News(NewsArgs),

    /// Recommendation ledger.
    Recommendations(RecommendationsArgs),

    /// Provider fetch history, newest first.
    ///
    /// # Examples
    ///
    ///   bullion audit
    ///   bullion audit --target news:GLD --limit 5
    Audit(AuditArgs),

    /// Print the resolved configuration and its warnings.
    Config,
}

#[derive(Debug, Args)]
pub struct PricesArgs {
    #[command(subcommand)]
    pub command: PricesCommand,
}

#[derive(Debug, Subcommand)]
pub enum PricesCommand {
    /// Fetch missing bars for one or more intervals.
    ///
    /// Without --start/--end the window is the last --days days up to the
    /// latest completed grid point.
    Sync(SyncArgs),

    /// List missing sub-ranges without fetching anything.
    Gaps(GapsArgs),

    /// Latest cached bars, oldest first.
    Latest(LatestArgs),

    /// Per-interval cache coverage.
    Summary,
}

/// Explicit window or a trailing number of days.
#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Days of history, overriding BULLION_FETCH_DAYS.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub days: Option<u32>,

    /// Window start (RFC 3339).
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Window end, exclusive (RFC 3339).
    #[arg(long, requires = "start")]
    pub end: Option<String>,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Interval to sync; repeat for several. Defaults to BULLION_INTERVALS.
    #[arg(long = "interval")]
    pub intervals: Vec<Interval>,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Re-fetch the whole window and overwrite cached bars.
    #[arg(long, default_value_t = false)]
    pub revalidate: bool,
}

#[derive(Debug, Args)]
pub struct GapsArgs {
    #[arg(long, default_value = "15m")]
    pub interval: Interval,

    #[command(flatten)]
    pub window: WindowArgs,
}

#[derive(Debug, Args)]
pub struct LatestArgs {
    #[arg(long, default_value = "15m")]
    pub interval: Interval,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct NewsArgs {
    #[command(subcommand)]
    pub command: NewsCommand,
}

#[derive(Debug, Subcommand)]
pub enum NewsCommand {
    /// Fetch, deduplicate and enrich articles.
    Ingest(IngestArgs),

    /// Cached articles, most recently published first.
    List(NewsListArgs),

    /// Case-insensitive search over title, summary and keywords.
    Search(NewsSearchArgs),

    /// Totals, categories and top publishers.
    Summary(NewsSummaryArgs),

    /// Articles published in the trailing hours.
    Recent(NewsRecentArgs),

    /// Daily average sentiment and its direction.
    Trend(AnalysisWindowArgs),

    /// Sentiment spread and market impact per category.
    Categories(AnalysisWindowArgs),

    /// Most frequent keywords with their sentiment.
    Keywords(KeywordAnalysisArgs),

    /// Sentiment bias of publishers with at least two scored articles.
    Publishers(AnalysisWindowArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Symbol to ingest; repeat for several. Defaults to BULLION_NEWS_SYMBOLS.
    #[arg(long = "symbol")]
    pub symbols: Vec<Symbol>,

    /// Articles per symbol, overriding BULLION_MAX_ARTICLES.
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(Debug, Args)]
pub struct NewsListArgs {
    /// monetary_policy, geopolitical, economic_data, supply_demand,
    /// market_movement or general.
    #[arg(long)]
    pub category: Option<NewsCategory>,

    /// positive, neutral or negative.
    #[arg(long)]
    pub sentiment: Option<SentimentLabel>,

    #[arg(long)]
    pub min_sentiment: Option<f64>,

    #[arg(long)]
    pub max_sentiment: Option<f64>,

    /// Only items first seen under this symbol.
    #[arg(long)]
    pub symbol: Option<Symbol>,

    /// Only items published within the last N days.
    #[arg(long)]
    pub days: Option<u32>,

    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct NewsSearchArgs {
    pub term: String,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct NewsSummaryArgs {
    /// Number of publishers to list.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct NewsRecentArgs {
    #[arg(long, default_value_t = 24)]
    pub hours: u32,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct AnalysisWindowArgs {
    /// Trailing days of published news to analyze.
    #[arg(long, default_value_t = 7)]
    pub days: u32,
}

#[derive(Debug, Args)]
pub struct KeywordAnalysisArgs {
    #[command(flatten)]
    pub window: AnalysisWindowArgs,

    /// Number of keywords to rank.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct RecommendationsArgs {
    #[command(subcommand)]
    pub command: RecommendationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RecommendationsCommand {
    /// Most recent recommendations first.
    List(RecommendationListArgs),

    /// Append one recommendation.
    Record(RecordArgs),
}

#[derive(Debug, Args)]
pub struct RecommendationListArgs {
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Skip failed analysis runs.
    #[arg(long, default_value_t = false)]
    pub successful: bool,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Recommendation text.
    pub text: String,

    #[arg(long, default_value = "15m")]
    pub interval: Interval,

    #[arg(long, default_value_t = 48)]
    pub hours: u32,

    /// Price the recommendation refers to.
    #[arg(long)]
    pub price: Option<f64>,

    /// Number of bars the analysis looked at.
    #[arg(long, default_value_t = 0)]
    pub points: u64,

    /// Mark the run as failed.
    #[arg(long, default_value_t = false)]
    pub failed: bool,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Target prefix such as `price:` or `news:GLD`.
    #[arg(long)]
    pub target: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}
