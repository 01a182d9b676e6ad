use std::sync::Arc;

use bullion_core::{
    ArticlesRequest, BarsRequest, Interval, NewsCandidate, NewsSource, PriceBar, PriceSource,
    ProviderId, RawArticle, RawBar, RawTimestamp, ScriptedNewsSource, ScriptedPriceSource,
    SimulatedAdapter, SourceError, SourceErrorKind, Symbol, UtcDateTime,
};

struct PriceCase {
    id: ProviderId,
    source: Arc<dyn PriceSource>,
}

struct NewsCase {
    id: ProviderId,
    source: Arc<dyn NewsSource>,
}

fn ts(value: &str) -> UtcDateTime {
    UtcDateTime::parse(value).expect("timestamp")
}

fn scripted_bars(request: &BarsRequest) -> Vec<RawBar> {
    let step = request.interval.step_seconds();
    let first = request.interval.align_up(request.start.unix_timestamp());
    (0..)
        .map(|i| first + i * step)
        .take_while(|&at| at < request.end.unix_timestamp())
        .map(|at| RawBar::new(at, 2040.0, 2041.0, 2039.0, 2040.5, 10))
        .collect()
}

fn price_cases(request: &BarsRequest) -> Vec<PriceCase> {
    let scripted = ScriptedPriceSource::new();
    scripted.push_bars(scripted_bars(request));
    vec![
        PriceCase {
            id: ProviderId::Simulated,
            source: Arc::new(SimulatedAdapter::default()),
        },
        PriceCase {
            id: ProviderId::Scripted,
            source: Arc::new(scripted),
        },
    ]
}

fn news_cases(symbol: &Symbol) -> Vec<NewsCase> {
    let scripted = ScriptedNewsSource::new();
    scripted.push_articles(
        symbol,
        (0..3)
            .map(|i| RawArticle {
                title: Some(format!("Gold update {i}")),
                summary: None,
                publisher: Some(String::from("Kitco")),
                published_at: Some(RawTimestamp::Unix(1_772_409_600 + i * 60)),
                link: None,
            })
            .collect(),
    );
    vec![
        NewsCase {
            id: ProviderId::Simulated,
            source: Arc::new(SimulatedAdapter::with_seed(42)),
        },
        NewsCase {
            id: ProviderId::Scripted,
            source: Arc::new(scripted),
        },
    ]
}

#[test]
fn bars_stay_inside_the_window_and_pass_validation() {
    let request = BarsRequest::new(
        Symbol::parse("GC=F").expect("symbol"),
        Interval::ThirtyMinutes,
        ts("2026-03-02T00:10:00Z"),
        ts("2026-03-02T03:00:00Z"),
    )
    .expect("request");

    for case in price_cases(&request) {
        assert_eq!(case.source.id(), case.id);
        let bars = case
            .source
            .fetch_bars(&request)
            .unwrap_or_else(|error| panic!("provider '{}' bars failed: {error}", case.id));

        assert_eq!(bars.len(), 5, "provider '{}': grid points in window", case.id);
        for raw in &bars {
            let bar = PriceBar::from_raw(raw, request.interval)
                .unwrap_or_else(|error| panic!("provider '{}' bar invalid: {error}", case.id));
            assert!(bar.ts >= request.start && bar.ts < request.end);
        }
    }
}

#[test]
fn articles_respect_the_limit_and_pass_validation() {
    let symbol = Symbol::parse("GLD").expect("symbol");
    let request = ArticlesRequest::new(symbol.clone(), 3).expect("request");

    for case in news_cases(&symbol) {
        assert_eq!(case.source.id(), case.id);
        let articles = case
            .source
            .fetch_articles(&request)
            .unwrap_or_else(|error| panic!("provider '{}' news failed: {error}", case.id));

        assert!(articles.len() <= request.limit, "provider '{}': limit", case.id);
        assert!(!articles.is_empty(), "provider '{}': no articles", case.id);
        for raw in &articles {
            NewsCandidate::from_raw(raw)
                .unwrap_or_else(|error| panic!("provider '{}' article invalid: {error}", case.id));
        }
    }
}

#[test]
fn simulated_bars_are_stable_across_instances() {
    let request = BarsRequest::new(
        Symbol::parse("GC=F").expect("symbol"),
        Interval::OneHour,
        ts("2026-03-02T00:00:00Z"),
        ts("2026-03-03T00:00:00Z"),
    )
    .expect("request");

    let first = SimulatedAdapter::with_seed(7).fetch_bars(&request).expect("bars");
    let second = SimulatedAdapter::with_seed(7).fetch_bars(&request).expect("bars");
    let other_seed = SimulatedAdapter::with_seed(8).fetch_bars(&request).expect("bars");

    assert_eq!(first.len(), 24);
    assert_eq!(first, second);
    assert_ne!(first, other_seed);
}

#[test]
fn request_constructors_reject_empty_windows() {
    let symbol = Symbol::parse("GC=F").expect("symbol");
    let at = ts("2026-03-02T00:00:00Z");

    let bars = BarsRequest::new(symbol.clone(), Interval::OneDay, at, at).expect_err("empty window");
    assert_eq!(bars.kind(), SourceErrorKind::InvalidRequest);

    let news = ArticlesRequest::new(symbol, 0).expect_err("zero limit");
    assert_eq!(news.kind(), SourceErrorKind::InvalidRequest);
}

#[test]
fn error_kinds_decide_retryability() {
    assert!(SourceError::unavailable("timeout").retryable());
    assert!(SourceError::rate_limited("429").retryable());
    assert!(!SourceError::invalid_request("bad symbol").retryable());
    assert!(!SourceError::internal("decode").retryable());
}
