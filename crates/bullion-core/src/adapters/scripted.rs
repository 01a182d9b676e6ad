use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::data_source::{ArticlesRequest, BarsRequest, NewsSource, PriceSource, SourceError};
use crate::{ProviderId, RawArticle, RawBar, Symbol};

type BarsResponse = Result<Vec<RawBar>, SourceError>;
type ArticlesResponse = Result<Vec<RawArticle>, SourceError>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Price source that replays queued responses in call order.
///
/// Every request is recorded. Once the queue is drained, calls fail with an
/// internal error so unexpected fetches surface in tests.
#[derive(Debug, Default)]
pub struct ScriptedPriceSource {
    responses: Mutex<VecDeque<BarsResponse>>,
    requests: Mutex<Vec<BarsRequest>>,
}

impl ScriptedPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bars(&self, bars: Vec<RawBar>) -> &Self {
        lock(&self.responses).push_back(Ok(bars));
        self
    }

    pub fn push_error(&self, error: SourceError) -> &Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<BarsRequest> {
        lock(&self.requests).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

impl PriceSource for ScriptedPriceSource {
    fn id(&self) -> ProviderId {
        ProviderId::Scripted
    }

    fn fetch_bars(&self, req: &BarsRequest) -> Result<Vec<RawBar>, SourceError> {
        lock(&self.requests).push(req.clone());
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::internal("script exhausted")))
    }
}

/// News source with a response queue per symbol.
///
/// Symbols without a script return no articles.
#[derive(Debug, Default)]
pub struct ScriptedNewsSource {
    responses: Mutex<BTreeMap<Symbol, VecDeque<ArticlesResponse>>>,
    requests: Mutex<Vec<ArticlesRequest>>,
}

impl ScriptedNewsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_articles(&self, symbol: &Symbol, articles: Vec<RawArticle>) -> &Self {
        self.push(symbol, Ok(articles))
    }

    pub fn push_error(&self, symbol: &Symbol, error: SourceError) -> &Self {
        self.push(symbol, Err(error))
    }

    fn push(&self, symbol: &Symbol, response: ArticlesResponse) -> &Self {
        lock(&self.responses)
            .entry(symbol.clone())
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<ArticlesRequest> {
        lock(&self.requests).clone()
    }
}

impl NewsSource for ScriptedNewsSource {
    fn id(&self) -> ProviderId {
        ProviderId::Scripted
    }

    fn fetch_articles(&self, req: &ArticlesRequest) -> Result<Vec<RawArticle>, SourceError> {
        lock(&self.requests).push(req.clone());
        lock(&self.responses)
            .get_mut(&req.symbol)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Interval, UtcDateTime};

    #[test]
    fn price_script_replays_in_order_then_fails() {
        let source = ScriptedPriceSource::new();
        source
            .push_error(SourceError::unavailable("timeout"))
            .push_bars(vec![RawBar::new(0, 1.0, 1.0, 1.0, 1.0, 1)]);

        let request = BarsRequest::new(
            Symbol::parse("GC=F").expect("symbol"),
            Interval::OneHour,
            UtcDateTime::from_unix(0).expect("start"),
            UtcDateTime::from_unix(3_600).expect("end"),
        )
        .expect("request");

        assert!(source.fetch_bars(&request).is_err());
        assert_eq!(source.fetch_bars(&request).expect("bars").len(), 1);
        let exhausted = source.fetch_bars(&request).expect_err("drained");
        assert_eq!(exhausted.message(), "script exhausted");
        assert_eq!(source.calls(), 3);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn news_script_is_keyed_by_symbol() {
        let source = ScriptedNewsSource::new();
        let gld = Symbol::parse("GLD").expect("symbol");
        source.push_articles(&gld, vec![RawArticle::default()]);

        let iau = ArticlesRequest::new(Symbol::parse("IAU").expect("symbol"), 5).expect("req");
        assert!(source.fetch_articles(&iau).expect("empty").is_empty());
        let gld_req = ArticlesRequest::new(gld, 5).expect("req");
        assert_eq!(source.fetch_articles(&gld_req).expect("articles").len(), 1);
        assert_eq!(source.calls(), 2);
    }
}
