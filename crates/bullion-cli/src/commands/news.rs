use bullion_core::{
    BullionConfig, CacheReader, EnvelopeError, IngestReport, NewsEngine, NewsFilter, UtcDateTime,
    Warehouse,
};
use serde::Serialize;

use crate::cli::{AnalysisWindowArgs, IngestArgs, NewsArgs, NewsCommand, NewsListArgs};
use crate::commands::{news_source, CommandResult};
use crate::error::CliError;

pub fn run(
    args: &NewsArgs,
    config: &BullionConfig,
    warehouse: Warehouse,
) -> Result<CommandResult, CliError> {
    match &args.command {
        NewsCommand::Ingest(args) => ingest(args, config, warehouse),
        NewsCommand::List(args) => {
            let items = CacheReader::new(warehouse).news(&list_filter(args))?;
            Ok(CommandResult::ok(serde_json::to_value(items)?))
        }
        NewsCommand::Search(args) => {
            let items = CacheReader::new(warehouse).search_news(&args.term, args.limit)?;
            Ok(CommandResult::ok(serde_json::to_value(items)?))
        }
        NewsCommand::Summary(args) => {
            let summary = CacheReader::new(warehouse).news_summary(args.top)?;
            Ok(CommandResult::ok(serde_json::to_value(summary)?))
        }
        NewsCommand::Recent(args) => {
            let since = UtcDateTime::now().saturating_sub_hours(args.hours);
            let items = CacheReader::new(warehouse).recent_news(since, args.limit)?;
            Ok(CommandResult::ok(serde_json::to_value(items)?))
        }
        NewsCommand::Trend(args) => {
            let trend = CacheReader::new(warehouse).sentiment_trend(window_start(args))?;
            analysis_result(trend, args)
        }
        NewsCommand::Categories(args) => {
            let analysis = CacheReader::new(warehouse).category_analysis(window_start(args))?;
            analysis_result(analysis, args)
        }
        NewsCommand::Keywords(args) => {
            let analysis = CacheReader::new(warehouse)
                .keyword_analysis(window_start(&args.window), args.top)?;
            analysis_result(analysis, &args.window)
        }
        NewsCommand::Publishers(args) => {
            let analysis = CacheReader::new(warehouse).publisher_analysis(window_start(args))?;
            analysis_result(analysis, args)
        }
    }
}

fn window_start(args: &AnalysisWindowArgs) -> UtcDateTime {
    UtcDateTime::now().saturating_sub_days(args.days)
}

/// An empty window is reported as a warning with `null` data.
fn analysis_result<T: Serialize>(
    analysis: Option<T>,
    args: &AnalysisWindowArgs,
) -> Result<CommandResult, CliError> {
    match analysis {
        Some(analysis) => Ok(CommandResult::ok(serde_json::to_value(analysis)?)),
        None => Ok(CommandResult::ok(serde_json::Value::Null).with_warnings(vec![format!(
            "no scored news in the last {} day(s)",
            args.days
        )])),
    }
}

fn ingest(
    args: &IngestArgs,
    config: &BullionConfig,
    warehouse: Warehouse,
) -> Result<CommandResult, CliError> {
    let symbols = if args.symbols.is_empty() {
        config.news_symbols.clone()
    } else {
        args.symbols.clone()
    };
    let max = args.max.unwrap_or(config.max_articles);

    let engine = NewsEngine::new(warehouse, news_source(config)?, config.news_config());
    let report = engine.ingest(symbols, max)?;

    let mut warnings = Vec::new();
    if report.items_rejected > 0 {
        warnings.push(format!(
            "{} article(s) failed validation and were not stored",
            report.items_rejected
        ));
    }
    let errors = if report.is_complete() {
        Vec::new()
    } else {
        vec![partial_ingest_error(&report)?]
    };

    Ok(CommandResult::ok(serde_json::to_value(&report)?)
        .with_provider(config.provider)
        .with_warnings(warnings)
        .with_errors(errors))
}

fn partial_ingest_error(report: &IngestReport) -> Result<EnvelopeError, CliError> {
    let mut message = format!(
        "{} of {} symbol(s) failed, {} skipped, {} article write(s) rolled back",
        report.symbols_failed, report.symbols_requested, report.symbols_skipped, report.items_failed
    );
    if let Some(first) = &report.first_error {
        message.push_str(&format!(" (first error: {first})"));
    }
    Ok(EnvelopeError::new("ingest.partial", message)?.with_retryable(true))
}

fn list_filter(args: &NewsListArgs) -> NewsFilter {
    let base = args.days.map(NewsFilter::recent_days).unwrap_or_default();
    NewsFilter {
        category: args.category,
        sentiment: args.sentiment,
        min_sentiment: args.min_sentiment,
        max_sentiment: args.max_sentiment,
        source_symbol: args.symbol.clone(),
        limit: args.limit,
        ..base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bullion_core::NewsCategory;

    #[test]
    fn list_filter_carries_every_flag() {
        let args = NewsListArgs {
            category: Some(NewsCategory::Geopolitical),
            sentiment: None,
            min_sentiment: Some(-0.2),
            max_sentiment: None,
            symbol: None,
            days: Some(3),
            limit: 7,
        };

        let filter = list_filter(&args);

        assert_eq!(filter.category, Some(NewsCategory::Geopolitical));
        assert_eq!(filter.min_sentiment, Some(-0.2));
        assert_eq!(filter.limit, 7);
        assert!(filter.since.is_some());
        assert!(filter.until.is_none());
    }

    #[test]
    fn partial_ingest_error_is_retryable() {
        let report = IngestReport {
            symbols_requested: 3,
            symbols_failed: 1,
            symbols_skipped: 2,
            ..IngestReport::default()
        };

        let error = partial_ingest_error(&report).expect("error");

        assert_eq!(error.code, "ingest.partial");
        assert_eq!(error.retryable, Some(true));
        assert!(error.message.starts_with("1 of 3 symbol(s) failed, 2 skipped"));
    }
}
