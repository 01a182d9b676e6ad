//! # Domain Models
//!
//! Strict shapes for everything the engines persist. Provider payloads
//! arrive as [`RawBar`] / [`RawArticle`] and cross into [`PriceBar`] /
//! [`NewsCandidate`] through a single validating constructor; nothing
//! unvalidated reaches the store.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PriceBar`] | OHLCV bar aligned to an [`Interval`] grid |
//! | [`NewsItem`] | Deduplicated, enriched news article |
//! | [`FetchAuditEntry`] | One provider fetch attempt |
//! | [`Recommendation`] | One analysis-layer recommendation |
//! | [`Symbol`] | Validated ticker or news topic |
//! | [`UtcDateTime`] | Whole-second UTC instant |

mod audit;
mod interval;
mod news;
pub(crate) mod price;
mod recommendation;
mod symbol;
mod timestamp;

pub use audit::{AuditTarget, FailureKind, FetchAuditEntry};
pub use interval::Interval;
pub use news::{
    NewsCandidate, NewsCategory, NewsItem, RawArticle, RawTimestamp, SentimentLabel,
    UNKNOWN_PUBLISHER,
};
pub use price::{CachedBar, PriceBar, RawBar};
pub use recommendation::{Recommendation, StoredRecommendation};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
