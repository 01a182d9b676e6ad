use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

/// Publisher recorded when the provider leaves it blank.
pub const UNKNOWN_PUBLISHER: &str = "Unknown";

/// Published time as a provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Unix(i64),
    Text(String),
}

impl RawTimestamp {
    pub fn to_utc(&self) -> Result<UtcDateTime, ValidationError> {
        match self {
            Self::Unix(seconds) => UtcDateTime::from_unix(*seconds),
            Self::Text(value) => UtcDateTime::parse_any_offset(value),
        }
    }
}

/// Loosely-typed article as handed over by a news provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub published_at: Option<RawTimestamp>,
    pub link: Option<String>,
}

/// An article that passed the ingestion boundary but is not yet enriched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsCandidate {
    pub title: String,
    pub summary: String,
    pub publisher: String,
    pub published_at: UtcDateTime,
    pub link: Option<String>,
}

impl NewsCandidate {
    pub fn from_raw(raw: &RawArticle) -> Result<Self, ValidationError> {
        let title = non_blank(raw.title.as_deref())
            .ok_or(ValidationError::BlankField { field: "title" })?;
        let published_at = raw
            .published_at
            .as_ref()
            .ok_or(ValidationError::MissingField {
                field: "published_at",
            })?
            .to_utc()?;

        Ok(Self {
            title,
            summary: non_blank(raw.summary.as_deref()).unwrap_or_default(),
            publisher: non_blank(raw.publisher.as_deref())
                .unwrap_or_else(|| UNKNOWN_PUBLISHER.to_owned()),
            published_at,
            link: non_blank(raw.link.as_deref()),
        })
    }

    /// Text the enrichment steps look at.
    pub fn text(&self) -> String {
        if self.summary.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.summary)
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Rule-based news category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    MonetaryPolicy,
    Geopolitical,
    EconomicData,
    SupplyDemand,
    MarketMovement,
    General,
}

impl NewsCategory {
    /// Match priority, highest first.
    pub const PRIORITY: [Self; 6] = [
        Self::MonetaryPolicy,
        Self::Geopolitical,
        Self::EconomicData,
        Self::SupplyDemand,
        Self::MarketMovement,
        Self::General,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MonetaryPolicy => "monetary_policy",
            Self::Geopolitical => "geopolitical",
            Self::EconomicData => "economic_data",
            Self::SupplyDemand => "supply_demand",
            Self::MarketMovement => "market_movement",
            Self::General => "general",
        }
    }
}

impl Display for NewsCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::PRIORITY
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or(ValidationError::InvalidCategory { value: normalized })
    }
}

/// Three-way reading of a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Scores strictly above this are positive.
    pub const POSITIVE_THRESHOLD: f64 = 0.1;
    /// Scores strictly below this are negative.
    pub const NEGATIVE_THRESHOLD: f64 = -0.1;

    pub fn from_score(score: f64) -> Self {
        if score > Self::POSITIVE_THRESHOLD {
            Self::Positive
        } else if score < Self::NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl Display for SentimentLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(ValidationError::InvalidSentimentLabel {
                value: other.to_owned(),
            }),
        }
    }
}

/// A stored, deduplicated news item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub fingerprint: String,
    pub title: String,
    pub summary: String,
    pub source_symbol: Symbol,
    pub publisher: String,
    pub published_at: UtcDateTime,
    pub link: Option<String>,
    pub sentiment_score: Option<f64>,
    pub category: Option<NewsCategory>,
    pub keywords: Vec<String>,
    pub fetched_at: UtcDateTime,
}

impl NewsItem {
    pub fn sentiment_label(&self) -> Option<SentimentLabel> {
        self.sentiment_score.map(SentimentLabel::from_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_boundary_is_exclusive_on_the_neutral_side() {
        assert_eq!(SentimentLabel::from_score(0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(0.1000001), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.1000001), SentimentLabel::Negative);
    }

    #[test]
    fn candidate_defaults_publisher_and_converts_offsets() {
        let candidate = NewsCandidate::from_raw(&RawArticle {
            title: Some(String::from("  Gold edges higher  ")),
            summary: None,
            publisher: Some(String::from("   ")),
            published_at: Some(RawTimestamp::Text(String::from("2026-03-02T09:00:00-05:00"))),
            link: Some(String::new()),
        })
        .expect("valid candidate");

        assert_eq!(candidate.title, "Gold edges higher");
        assert_eq!(candidate.publisher, UNKNOWN_PUBLISHER);
        assert_eq!(candidate.published_at.format_rfc3339(), "2026-03-02T14:00:00Z");
        assert_eq!(candidate.link, None);
        assert_eq!(candidate.text(), "Gold edges higher");
    }

    #[test]
    fn candidate_requires_title_and_timestamp() {
        let missing_title = RawArticle {
            published_at: Some(RawTimestamp::Unix(1_772_409_600)),
            ..RawArticle::default()
        };
        assert_eq!(
            NewsCandidate::from_raw(&missing_title).expect_err("must fail"),
            ValidationError::BlankField { field: "title" }
        );

        let missing_time = RawArticle {
            title: Some(String::from("Gold")),
            ..RawArticle::default()
        };
        assert_eq!(
            NewsCandidate::from_raw(&missing_time).expect_err("must fail"),
            ValidationError::MissingField {
                field: "published_at"
            }
        );
    }

    #[test]
    fn parses_categories_by_name() {
        assert_eq!(
            NewsCategory::from_str("Supply_Demand").expect("category"),
            NewsCategory::SupplyDemand
        );
        assert!(NewsCategory::from_str("weather").is_err());
    }
}
