//! News deduplication and enrichment.
//!
//! Candidates are fingerprinted over their normalized title, publisher and
//! publish instant. A known fingerprint is skipped without enrichment unless
//! the stored item still lacks a sentiment score, in which case the new
//! enrichment is backfilled onto it.

pub mod analysis;
pub mod category;
pub mod fingerprint;
pub mod keywords;
pub mod sentiment;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use bullion_warehouse::{NewsWrite, Warehouse};

use crate::records::{audit_to_record, news_to_record};
use crate::retry::{call_with_retry, serialize_delay_ms};
use crate::sync::failure_kind;
use crate::{
    ArticlesRequest, AuditTarget, CallPacer, CoreError, FailureKind, FetchAuditEntry,
    NewsCandidate, NewsCategory, NewsItem, NewsSource, RetryConfig, Symbol, UtcDateTime,
    ValidationError,
};

pub use analysis::{
    CategoryAnalysis, CategoryStats, KeywordAnalysis, KeywordSignal, KeywordStats, MarketImpact,
    PublisherAnalysis, PublisherBias, PublisherReliability, PublisherStats, SentimentTrend,
    TrendDirection,
};
pub use category::CategoryRules;
pub use fingerprint::{fingerprint, normalize};
pub use keywords::extract_keywords;
pub use sentiment::SentimentLexicon;

/// Lowercased alphanumeric runs.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Settings for [`NewsEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewsConfig {
    pub retry: RetryConfig,
    /// Minimum spacing between provider calls.
    pub call_delay: Duration,
    pub keyword_limit: usize,
    pub enable_sentiment: bool,
    pub lexicon: SentimentLexicon,
    pub categories: CategoryRules,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            call_delay: Duration::from_secs(1),
            keyword_limit: 8,
            enable_sentiment: true,
            lexicon: SentimentLexicon::default(),
            categories: CategoryRules::default(),
        }
    }
}

/// Derived metadata for one article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrichment {
    pub sentiment_score: Option<f64>,
    pub category: NewsCategory,
    pub keywords: Vec<String>,
}

impl NewsConfig {
    pub fn enrich(&self, text: &str) -> Enrichment {
        let tokens = tokenize(text);
        Enrichment {
            sentiment_score: if self.enable_sentiment {
                self.lexicon.score(&tokens)
            } else {
                None
            },
            category: self.categories.classify(&tokens),
            keywords: extract_keywords(&tokens, self.keyword_limit),
        }
    }
}

/// Outcome of one ingest call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub items_added: u64,
    pub items_skipped_duplicate: u64,
    pub items_backfilled: u64,
    /// Articles that failed validation.
    pub items_rejected: u64,
    /// Articles whose write was rolled back.
    pub items_failed: u64,
    pub symbols_requested: u64,
    pub symbols_succeeded: u64,
    pub symbols_failed: u64,
    /// Symbols left untried after a rate limit.
    pub symbols_skipped: u64,
    pub provider_calls: u64,
    pub first_error: Option<String>,
    #[serde(rename = "rate_limited_ms", serialize_with = "serialize_delay_ms")]
    pub rate_limited: Option<Duration>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.symbols_failed == 0 && self.symbols_skipped == 0 && self.items_failed == 0
    }

    fn note_error(&mut self, detail: String) {
        if self.first_error.is_none() {
            self.first_error = Some(detail);
        }
    }
}

/// Fetches candidate articles per symbol, drops duplicates and stores the
/// enriched remainder.
pub struct NewsEngine {
    warehouse: Warehouse,
    source: Arc<dyn NewsSource>,
    config: NewsConfig,
    pacer: CallPacer,
}

impl NewsEngine {
    pub fn new(warehouse: Warehouse, source: Arc<dyn NewsSource>, config: NewsConfig) -> Self {
        Self {
            pacer: CallPacer::new(config.call_delay),
            warehouse,
            source,
            config,
        }
    }

    pub fn config(&self) -> &NewsConfig {
        &self.config
    }

    /// Ingest up to `max_per_symbol` articles for each distinct symbol, in
    /// sorted order.
    pub fn ingest<I>(
        &self,
        source_symbols: I,
        max_per_symbol: usize,
    ) -> Result<IngestReport, CoreError>
    where
        I: IntoIterator<Item = Symbol>,
    {
        if max_per_symbol == 0 {
            return Err(ValidationError::NotPositive {
                field: "max_per_symbol",
            }
            .into());
        }

        let symbols: BTreeSet<Symbol> = source_symbols.into_iter().collect();
        let mut report = IngestReport {
            symbols_requested: symbols.len() as u64,
            ..IngestReport::default()
        };

        for (index, symbol) in symbols.iter().enumerate() {
            if report.rate_limited.is_some() {
                report.symbols_skipped = (symbols.len() - index) as u64;
                break;
            }
            self.ingest_symbol(symbol, max_per_symbol, &mut report);
        }

        info!(
            symbols = report.symbols_requested,
            items_added = report.items_added,
            items_skipped_duplicate = report.items_skipped_duplicate,
            items_backfilled = report.items_backfilled,
            items_rejected = report.items_rejected,
            symbols_failed = report.symbols_failed,
            symbols_skipped = report.symbols_skipped,
            "news ingest finished"
        );
        Ok(report)
    }

    fn ingest_symbol(&self, symbol: &Symbol, max_per_symbol: usize, report: &mut IngestReport) {
        let target = AuditTarget::News(symbol.clone());
        let request = ArticlesRequest {
            symbol: symbol.clone(),
            limit: max_per_symbol,
        };

        let outcome = call_with_retry(&self.config.retry, |_| {
            self.pacer.wait();
            self.source.fetch_articles(&request)
        });
        report.provider_calls += u64::from(outcome.attempts);

        let articles = match outcome.result {
            Ok(articles) => articles,
            Err(error) => {
                let kind = failure_kind(&error);
                warn!(symbol = %symbol, error = %error, "article fetch failed");
                report.symbols_failed += 1;
                report.note_error(kind.detail(&error));
                if error.is_rate_limited() {
                    report.rate_limited = Some(outcome.waited);
                }
                self.audit(FetchAuditEntry::failure(&target, kind, &error));
                return;
            }
        };

        let fetched_at = UtcDateTime::now();
        let candidates = articles.iter().take(max_per_symbol);
        for raw in candidates {
            let candidate = match NewsCandidate::from_raw(raw) {
                Ok(candidate) => candidate,
                Err(error) => {
                    warn!(symbol = %symbol, error = %error, "rejected article");
                    report.items_rejected += 1;
                    report.note_error(FailureKind::Validation.detail(&error));
                    self.audit(
                        FetchAuditEntry::failure(&target, FailureKind::Validation, &error)
                            .with_fetched_count(1),
                    );
                    continue;
                }
            };

            if let Err(error) = self.store_candidate(candidate, symbol, fetched_at, report) {
                warn!(symbol = %symbol, error = %error, "news item not stored");
                report.items_failed += 1;
                report.note_error(FailureKind::StoreIntegrity.detail(&error));
                self.audit(
                    FetchAuditEntry::failure(&target, FailureKind::StoreIntegrity, &error)
                        .with_fetched_count(1),
                );
            }
        }

        report.symbols_succeeded += 1;
        self.audit(FetchAuditEntry::success(&target, articles.len() as u64));
    }

    fn store_candidate(
        &self,
        candidate: NewsCandidate,
        symbol: &Symbol,
        fetched_at: UtcDateTime,
        report: &mut IngestReport,
    ) -> Result<(), CoreError> {
        let fingerprint =
            fingerprint(&candidate.title, &candidate.publisher, candidate.published_at);

        let existing = self.warehouse.news_by_fingerprint(&fingerprint)?;
        let can_backfill = self.config.enable_sentiment
            && existing
                .as_ref()
                .is_some_and(|record| record.sentiment_score.is_none());
        if existing.is_some() && !can_backfill {
            debug!(%fingerprint, "duplicate article skipped");
            report.items_skipped_duplicate += 1;
            return Ok(());
        }

        let enrichment = self.config.enrich(&candidate.text());
        let item = NewsItem {
            fingerprint,
            title: candidate.title,
            summary: candidate.summary,
            source_symbol: symbol.clone(),
            publisher: candidate.publisher,
            published_at: candidate.published_at,
            link: candidate.link,
            sentiment_score: enrichment.sentiment_score,
            category: Some(enrichment.category),
            keywords: enrichment.keywords,
            fetched_at,
        };

        match self.warehouse.store_news(&news_to_record(&item))? {
            NewsWrite::Inserted => report.items_added += 1,
            NewsWrite::Backfilled => report.items_backfilled += 1,
            NewsWrite::Duplicate => report.items_skipped_duplicate += 1,
        }
        Ok(())
    }

    fn audit(&self, entry: FetchAuditEntry) {
        if let Err(error) = self.warehouse.append_audit(&audit_to_record(&entry)) {
            warn!(
                audit_target = %entry.target,
                error = %error,
                "failed to append fetch audit entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_splits_on_punctuation_and_folds_case() {
        assert_eq!(
            tokenize("Gold's rally: U.S. CPI-driven!"),
            vec!["gold", "s", "rally", "u", "s", "cpi", "driven"]
        );
    }

    #[test]
    fn enrichment_respects_the_sentiment_switch() {
        let mut config = NewsConfig::default();
        let text = "Gold prices surge as Fed signals rate cut";

        let enriched = config.enrich(text);
        assert_eq!(enriched.category, NewsCategory::MonetaryPolicy);
        assert_eq!(enriched.sentiment_score, Some(1.0));
        assert_eq!(enriched.keywords[0], "gold");

        config.enable_sentiment = false;
        let enriched = config.enrich(text);
        assert_eq!(enriched.sentiment_score, None);
        assert_eq!(enriched.category, NewsCategory::MonetaryPolicy);
    }
}
