//! Behavior-driven tests for news ingestion.
//!
//! These tests verify HOW articles are deduplicated, enriched and audited
//! across symbols and repeated runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bullion_core::{
    CacheReader, CoreError, NewsCategory, NewsConfig, NewsEngine, NewsFilter, RawArticle,
    RawTimestamp, RetryConfig, ScriptedNewsSource, SourceError, Symbol, ValidationError,
    Warehouse, WarehouseConfig,
};
use tempfile::{tempdir, TempDir};

fn open_warehouse() -> (TempDir, Warehouse) {
    let temp = tempdir().expect("tempdir");
    let warehouse = Warehouse::open(WarehouseConfig {
        bullion_home: temp.path().to_path_buf(),
        db_path: temp.path().join("bullion.duckdb"),
        max_pool_size: 2,
    })
    .expect("warehouse open");
    (temp, warehouse)
}

fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("symbol")
}

fn article(title: &str, publisher: &str, published_at: &str) -> RawArticle {
    RawArticle {
        title: Some(title.to_owned()),
        summary: Some(String::from("Traders weigh the outlook for bullion.")),
        publisher: Some(publisher.to_owned()),
        published_at: Some(RawTimestamp::Text(published_at.to_owned())),
        link: Some(format!("https://news.example.com/{}", title.len())),
    }
}

fn config(enable_sentiment: bool) -> NewsConfig {
    NewsConfig {
        retry: RetryConfig::no_retry(),
        call_delay: Duration::ZERO,
        enable_sentiment,
        ..NewsConfig::default()
    }
}

fn engine(warehouse: &Warehouse, source: &Arc<ScriptedNewsSource>, config: NewsConfig) -> NewsEngine {
    NewsEngine::new(warehouse.clone(), source.clone(), config)
}

// =============================================================================
// News Ingest: Deduplication
// =============================================================================

#[test]
fn when_a_batch_repeats_an_article_it_is_stored_once() {
    // Given: Three articles where two differ only in case and spacing
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    let gold = symbol("GOLD");
    source.push_articles(
        &gold,
        vec![
            article("Gold surges on Fed rate cut bets", "Reuters", "2026-03-02T09:00:00Z"),
            article("  GOLD surges on Fed   rate cut bets ", "reuters", "2026-03-02T09:00:00Z"),
            article("Miners report lower output", "Mining Weekly", "2026-03-02T08:00:00Z"),
        ],
    );

    // When: The symbol is ingested
    let report = engine(&warehouse, &source, config(true))
        .ingest([gold], 10)
        .expect("ingest");

    // Then: Two items are added and one duplicate skipped
    assert_eq!(report.items_added, 2);
    assert_eq!(report.items_skipped_duplicate, 1);
    assert!(report.is_complete());
    assert_eq!(warehouse.news_count().expect("count"), 2);
}

#[test]
fn when_the_same_story_appears_under_two_symbols_it_is_stored_once() {
    // Given: The same story returned for GLD and IAU, published in different offsets
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    source
        .push_articles(
            &symbol("IAU"),
            vec![article("Central bank buying lifts gold", "Bloomberg", "2026-03-02T10:00:00+01:00")],
        )
        .push_articles(
            &symbol("GLD"),
            vec![article("Central bank buying lifts gold", "Bloomberg", "2026-03-02T09:00:00Z")],
        );

    // When: Both symbols are ingested in one call
    let report = engine(&warehouse, &source, config(true))
        .ingest([symbol("IAU"), symbol("GLD")], 5)
        .expect("ingest");

    // Then: The first symbol in sorted order owns the stored item
    assert_eq!(report.symbols_requested, 2);
    assert_eq!(report.items_added, 1);
    assert_eq!(report.items_skipped_duplicate, 1);
    let requested: Vec<_> = source
        .requests()
        .into_iter()
        .map(|request| request.symbol.to_string())
        .collect();
    assert_eq!(requested, vec!["GLD", "IAU"]);

    let items = CacheReader::new(warehouse)
        .news(&NewsFilter::default())
        .expect("news");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].source_symbol, symbol("GLD"));
}

#[test]
fn when_ingest_runs_twice_nothing_new_is_added() {
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    let gld = symbol("GLD");
    let batch = vec![
        article("Gold rally extends into third week", "Kitco", "2026-03-02T07:00:00Z"),
        article("Dollar strength weighs on metals", "CNBC", "2026-03-02T06:00:00Z"),
    ];
    source
        .push_articles(&gld, batch.clone())
        .push_articles(&gld, batch);
    let engine = engine(&warehouse, &source, config(true));

    let first = engine.ingest([gld.clone()], 10).expect("first");
    let second = engine.ingest([gld], 10).expect("second");

    assert_eq!(first.items_added, 2);
    assert_eq!(second.items_added, 0);
    assert_eq!(second.items_skipped_duplicate, 2);
    assert_eq!(second.items_backfilled, 0);
}

// =============================================================================
// News Ingest: Enrichment
// =============================================================================

#[test]
fn when_article_is_stored_it_carries_sentiment_category_and_keywords() {
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    let gld = symbol("GLD");
    source.push_articles(
        &gld,
        vec![RawArticle {
            summary: Some(String::from("Gold prices surge after the Fed signals a rate cut.")),
            ..article("Gold surges as Fed signals rate cut", "Reuters", "2026-03-02T09:00:00Z")
        }],
    );

    engine(&warehouse, &source, config(true))
        .ingest([gld], 5)
        .expect("ingest");

    let item = CacheReader::new(warehouse)
        .news(&NewsFilter::default())
        .expect("news")
        .remove(0);
    assert_eq!(item.category, Some(NewsCategory::MonetaryPolicy));
    assert!(item.sentiment_score.is_some_and(|score| score > 0.1));
    assert!(item.keywords.iter().any(|keyword| keyword == "gold"));
    assert!(item.keywords.len() <= 8);
}

#[test]
fn when_sentiment_was_disabled_a_later_run_backfills_it() {
    // Given: An item stored while sentiment scoring was off
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    let gld = symbol("GLD");
    let story = article("Gold prices surge to record high", "Reuters", "2026-03-02T09:00:00Z");
    source
        .push_articles(&gld, vec![story.clone()])
        .push_articles(&gld, vec![story]);

    let first = engine(&warehouse, &source, config(false))
        .ingest([gld.clone()], 5)
        .expect("first");
    assert_eq!(first.items_added, 1);
    let reader = CacheReader::new(warehouse.clone());
    let stored = reader.news(&NewsFilter::default()).expect("news");
    assert_eq!(stored[0].sentiment_score, None);

    // When: The same article arrives with scoring enabled
    let second = engine(&warehouse, &source, config(true))
        .ingest([gld], 5)
        .expect("second");

    // Then: The existing row gains a score instead of a new row being written
    assert_eq!(second.items_backfilled, 1);
    assert_eq!(second.items_added, 0);
    let stored = reader.news(&NewsFilter::default()).expect("news");
    assert_eq!(stored.len(), 1);
    assert!(stored[0].sentiment_score.is_some());
}

// =============================================================================
// News Ingest: Validation and Limits
// =============================================================================

#[test]
fn when_articles_are_malformed_they_are_rejected_and_audited() {
    // Given: A blank title, a missing timestamp and an unparseable timestamp
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    let gc = symbol("GC=F");
    source.push_articles(
        &gc,
        vec![
            article("   ", "Reuters", "2026-03-02T09:00:00Z"),
            RawArticle {
                published_at: None,
                ..article("No timestamp here", "Reuters", "")
            },
            article("Bad clock", "Reuters", "yesterday afternoon"),
            article("Gold steady ahead of payrolls", "CNBC", "2026-03-02T09:30:00Z"),
        ],
    );

    // When: The symbol is ingested
    let report = engine(&warehouse, &source, config(true))
        .ingest([gc], 10)
        .expect("ingest");

    // Then: Only the valid article is stored and each rejection is audited
    assert_eq!(report.items_added, 1);
    assert_eq!(report.items_rejected, 3);
    assert_eq!(report.symbols_succeeded, 1);
    assert!(report
        .first_error
        .as_deref()
        .is_some_and(|detail| detail.starts_with("validation: ")));

    let audit = CacheReader::new(warehouse)
        .audit(Some("news:GC=F"), 10)
        .expect("audit");
    assert_eq!(
        audit
            .iter()
            .filter(|entry| entry.failure_kind() == Some("validation"))
            .count(),
        3
    );
    assert!(audit.iter().any(|entry| entry.succeeded && entry.fetched_count == 4));
}

#[test]
fn when_max_per_symbol_is_zero_ingest_is_rejected() {
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());

    let error = engine(&warehouse, &source, config(true))
        .ingest([symbol("GLD")], 0)
        .expect_err("must reject");

    assert!(matches!(
        error,
        CoreError::Validation(ValidationError::NotPositive { .. })
    ));
    assert_eq!(source.calls(), 0);
}

#[test]
fn when_provider_returns_too_many_articles_only_the_first_are_kept() {
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    let gld = symbol("GLD");
    source.push_articles(
        &gld,
        (0..5)
            .map(|hour| {
                article(
                    &format!("Gold market update {hour}"),
                    "Kitco",
                    &format!("2026-03-02T0{hour}:00:00Z"),
                )
            })
            .collect(),
    );

    let report = engine(&warehouse, &source, config(true))
        .ingest([gld], 2)
        .expect("ingest");

    assert_eq!(report.items_added, 2);
    assert_eq!(source.requests()[0].limit, 2);
}

// =============================================================================
// News Ingest: Provider Failures
// =============================================================================

#[test]
fn when_one_symbol_fails_the_others_are_still_ingested() {
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    source
        .push_error(&symbol("GLD"), SourceError::invalid_request("unknown symbol"))
        .push_articles(
            &symbol("IAU"),
            vec![article("Gold holds gains", "Reuters", "2026-03-02T09:00:00Z")],
        );

    let report = engine(&warehouse, &source, config(true))
        .ingest([symbol("GLD"), symbol("IAU")], 5)
        .expect("ingest");

    assert_eq!(report.symbols_failed, 1);
    assert_eq!(report.symbols_succeeded, 1);
    assert_eq!(report.items_added, 1);
    assert!(!report.is_complete());

    let failures: Vec<_> = CacheReader::new(warehouse)
        .audit(Some("news:GLD"), 5)
        .expect("audit");
    assert_eq!(failures[0].failure_kind(), Some("provider_rejected"));
}

#[test]
fn when_provider_rate_limits_the_remaining_symbols_are_skipped() {
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    source.push_error(&symbol("GLD"), SourceError::rate_limited("429"));

    let report = engine(&warehouse, &source, config(true))
        .ingest([symbol("IAU"), symbol("GLD"), symbol("GOLD")], 5)
        .expect("ingest");

    assert_eq!(report.symbols_failed, 1);
    assert_eq!(report.symbols_skipped, 2);
    assert_eq!(report.rate_limited, Some(Duration::ZERO));
    assert_eq!(source.calls(), 1);
}

// =============================================================================
// News Ingest: Call Pacing
// =============================================================================

#[test]
fn when_call_delay_is_set_symbols_are_fetched_at_that_pace() {
    // Given: Three symbols and a 40ms minimum spacing between provider calls
    let (_temp, warehouse) = open_warehouse();
    let source = Arc::new(ScriptedNewsSource::new());
    source.push_articles(
        &symbol("GLD"),
        vec![article("Gold steadies ahead of payrolls", "Reuters", "2026-03-02T09:00:00Z")],
    );
    let paced = NewsConfig {
        call_delay: Duration::from_millis(40),
        ..config(true)
    };

    // When: All three are ingested in one run
    let started = Instant::now();
    let report = engine(&warehouse, &source, paced)
        .ingest([symbol("GLD"), symbol("IAU"), symbol("GOLD")], 5)
        .expect("ingest");

    // Then: Every symbol was fetched and the run took at least two delays
    assert_eq!(report.symbols_requested, 3);
    assert_eq!(report.items_added, 1);
    assert_eq!(source.calls(), 3);
    assert!(started.elapsed() >= Duration::from_millis(80));
}
