use bullion_core::{
    BullionConfig, CacheReader, EnvelopeError, FetchMode, GapDetector, PriceSyncEngine,
    SyncReport, Warehouse,
};
use serde_json::json;

use crate::cli::{GapsArgs, LatestArgs, PricesArgs, PricesCommand, SyncArgs};
use crate::commands::{price_source, resolve_window, CommandResult};
use crate::error::CliError;

pub fn run(
    args: &PricesArgs,
    config: &BullionConfig,
    warehouse: Warehouse,
) -> Result<CommandResult, CliError> {
    match &args.command {
        PricesCommand::Sync(args) => sync(args, config, warehouse),
        PricesCommand::Gaps(args) => gaps(args, config, warehouse),
        PricesCommand::Latest(args) => latest(args, warehouse),
        PricesCommand::Summary => {
            let summary = CacheReader::new(warehouse).price_summary()?;
            Ok(CommandResult::ok(serde_json::to_value(summary)?))
        }
    }
}

fn sync(
    args: &SyncArgs,
    config: &BullionConfig,
    warehouse: Warehouse,
) -> Result<CommandResult, CliError> {
    let intervals = if args.intervals.is_empty() {
        config.intervals.clone()
    } else {
        args.intervals.clone()
    };
    let mode = if args.revalidate {
        FetchMode::Revalidate
    } else {
        FetchMode::Incremental
    };
    let engine = PriceSyncEngine::new(warehouse, price_source(config)?, config.sync_config());

    let mut reports = Vec::with_capacity(intervals.len());
    let mut warnings = Vec::new();
    for interval in &intervals {
        let (start, end) = resolve_window(&args.window, *interval, config.fetch_days)?;
        let report = engine.sync_with(*interval, start, end, mode)?;
        let rate_limited = report.rate_limited.is_some();
        reports.push(report);
        if rate_limited {
            let untouched = intervals.len() - reports.len();
            if untouched > 0 {
                warnings.push(format!(
                    "provider rate limit reached; {untouched} interval(s) left for the next run"
                ));
            }
            break;
        }
    }

    let errors = reports
        .iter()
        .filter(|report| !report.is_complete())
        .map(partial_sync_error)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CommandResult::ok(serde_json::to_value(&reports)?)
        .with_provider(config.provider)
        .with_warnings(warnings)
        .with_errors(errors))
}

fn partial_sync_error(report: &SyncReport) -> Result<EnvelopeError, CliError> {
    let mut message = format!(
        "{}: {} of {} range(s) failed, {} skipped",
        report.interval,
        report.ranges_failed,
        report.ranges_total(),
        report.ranges_skipped
    );
    if let Some(first) = &report.first_error {
        message.push_str(&format!(" (first error: {first})"));
    }
    Ok(EnvelopeError::new("sync.partial", message)?.with_retryable(true))
}

fn gaps(
    args: &GapsArgs,
    config: &BullionConfig,
    warehouse: Warehouse,
) -> Result<CommandResult, CliError> {
    let (start, end) = resolve_window(&args.window, args.interval, config.fetch_days)?;
    let ranges = GapDetector::new(warehouse).missing_ranges(args.interval, start, end)?;
    let missing_points: u64 = ranges
        .iter()
        .map(|range| range.grid_len(args.interval))
        .sum();

    Ok(CommandResult::ok(json!({
        "interval": args.interval,
        "start": start,
        "end": end,
        "missing_points": missing_points,
        "ranges": ranges,
    })))
}

fn latest(args: &LatestArgs, warehouse: Warehouse) -> Result<CommandResult, CliError> {
    let bars = CacheReader::new(warehouse).latest_bars(args.interval, args.limit)?;
    Ok(CommandResult::ok(serde_json::to_value(bars)?))
}
