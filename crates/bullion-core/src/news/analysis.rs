//! Structured sentiment analyses over the cached news.
//!
//! Each analysis is built from warehouse aggregates and returns `None` when
//! the window holds no scored items.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;

use bullion_warehouse::{CategorySentiment, DailySentiment, PublisherSentiment, ScoredKeywords};

use crate::NewsCategory;

/// Margin the recent daily average must clear before the trend turns.
const TREND_MARGIN: f64 = 0.05;
/// Days averaged as "recent" when judging the trend.
const RECENT_DAYS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Neutral,
}

/// Daily sentiment over a window and where it is heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentTrend {
    /// Average of the latest day.
    pub current_sentiment: f64,
    pub direction: TrendDirection,
    pub average_sentiment: f64,
    pub max_sentiment: f64,
    pub min_sentiment: f64,
    /// Population standard deviation of the daily averages.
    pub volatility: f64,
    pub total_items: u64,
    pub days: Vec<DailySentiment>,
}

impl SentimentTrend {
    /// `days` must be ordered oldest first.
    pub fn from_days(days: Vec<DailySentiment>) -> Option<Self> {
        let values: Vec<f64> = days.iter().map(|day| day.average_sentiment).collect();
        let current_sentiment = *values.last()?;

        Some(Self {
            current_sentiment,
            direction: direction(&values),
            average_sentiment: mean(&values),
            max_sentiment: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_sentiment: values.iter().copied().fold(f64::INFINITY, f64::min),
            volatility: std_dev(&values),
            total_items: days.iter().map(|day| day.item_count).sum(),
            days,
        })
    }
}

/// Recent days against the ones before them.
///
/// With more than three days the mean of the last three is compared with the
/// mean of everything earlier. Three days compare their mean with the first
/// day, and two days compare the latest day with the first.
fn direction(values: &[f64]) -> TrendDirection {
    if values.len() < 2 {
        return TrendDirection::Neutral;
    }
    let split = values.len().saturating_sub(RECENT_DAYS);
    let (recent, older) = if values.len() > RECENT_DAYS {
        (mean(&values[split..]), mean(&values[..split]))
    } else if values.len() == RECENT_DAYS {
        (mean(values), values[0])
    } else {
        (values[values.len() - 1], values[0])
    };

    if recent > older + TREND_MARGIN {
        TrendDirection::Improving
    } else if recent < older - TREND_MARGIN {
        TrendDirection::Declining
    } else {
        TrendDirection::Neutral
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketImpact {
    High,
    Medium,
    Low,
}

impl MarketImpact {
    /// `|average| * weight`, weighted by how strongly the category moves gold.
    pub fn assess(category: &str, average_sentiment: f64) -> Self {
        let weight = match NewsCategory::from_str(category) {
            Ok(NewsCategory::MonetaryPolicy) => 0.9,
            Ok(NewsCategory::EconomicData) => 0.8,
            Ok(NewsCategory::Geopolitical) => 0.7,
            Ok(NewsCategory::MarketMovement) => 0.6,
            Ok(NewsCategory::SupplyDemand) | Err(_) => 0.5,
            Ok(NewsCategory::General) => 0.3,
        };
        let score = average_sentiment.abs() * weight;
        if score > 0.4 {
            Self::High
        } else if score > 0.2 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub item_count: u64,
    pub average_sentiment: f64,
    pub max_sentiment: f64,
    pub min_sentiment: f64,
    pub sentiment_range: f64,
    pub market_impact: MarketImpact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAnalysis {
    /// Most covered first.
    pub categories: Vec<CategoryStats>,
    pub most_covered: String,
    pub most_positive: String,
    pub most_negative: String,
}

impl CategoryAnalysis {
    /// `rows` must be ordered by item count, highest first.
    pub fn from_rows(rows: Vec<CategorySentiment>) -> Option<Self> {
        let most_covered = rows.first()?.category.clone();
        let most_positive = first_extreme(&rows, |row| row.average_sentiment, |a, b| a > b)?
            .category
            .clone();
        let most_negative = first_extreme(&rows, |row| row.average_sentiment, |a, b| a < b)?
            .category
            .clone();

        let categories = rows
            .into_iter()
            .map(|row| CategoryStats {
                market_impact: MarketImpact::assess(&row.category, row.average_sentiment),
                sentiment_range: row.max_sentiment - row.min_sentiment,
                category: row.category,
                item_count: row.item_count,
                average_sentiment: row.average_sentiment,
                max_sentiment: row.max_sentiment,
                min_sentiment: row.min_sentiment,
            })
            .collect();

        Some(Self {
            categories,
            most_covered,
            most_positive,
            most_negative,
        })
    }
}

/// Reading of a keyword's average sentiment for gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSignal {
    StrongBullish,
    Bullish,
    StrongBearish,
    Bearish,
    MixedSignal,
    Positive,
    Negative,
    Neutral,
}

const BULLISH_TERMS: [&str; 5] = ["fed", "inflation", "crisis", "uncertainty", "safe haven"];
const BEARISH_TERMS: [&str; 3] = ["strong dollar", "rate hikes", "economic growth"];

impl KeywordSignal {
    pub fn interpret(keyword: &str, average_sentiment: f64) -> Self {
        let keyword = keyword.to_lowercase();
        if BULLISH_TERMS.contains(&keyword.as_str()) {
            if average_sentiment > 0.1 {
                Self::StrongBullish
            } else if average_sentiment < -0.1 {
                Self::MixedSignal
            } else {
                Self::Bullish
            }
        } else if BEARISH_TERMS.contains(&keyword.as_str()) {
            if average_sentiment > 0.1 {
                Self::MixedSignal
            } else if average_sentiment < -0.1 {
                Self::StrongBearish
            } else {
                Self::Bearish
            }
        } else if average_sentiment > 0.2 {
            Self::Positive
        } else if average_sentiment < -0.2 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordStats {
    pub keyword: String,
    pub count: u64,
    pub average_sentiment: f64,
    /// Population standard deviation.
    pub sentiment_std: f64,
    pub signal: KeywordSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordAnalysis {
    /// By count, ties in first-seen order.
    pub top_keywords: Vec<KeywordStats>,
    pub total_unique_keywords: usize,
    /// The first five keywords seen in the window.
    pub trending: Vec<String>,
}

impl KeywordAnalysis {
    pub fn from_rows(rows: &[ScoredKeywords], top: usize) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let mut first_seen: Vec<&str> = Vec::new();
        let mut scores: HashMap<&str, Vec<f64>> = HashMap::new();
        for row in rows {
            for keyword in &row.keywords {
                let entry = scores.entry(keyword.as_str()).or_insert_with(|| {
                    first_seen.push(keyword.as_str());
                    Vec::new()
                });
                entry.push(row.sentiment_score);
            }
        }

        let mut ranked = first_seen.clone();
        ranked.sort_by_key(|keyword| std::cmp::Reverse(scores[keyword].len()));
        let top_keywords = ranked
            .into_iter()
            .take(top)
            .map(|keyword| {
                let values = &scores[keyword];
                let average_sentiment = mean(values);
                KeywordStats {
                    keyword: keyword.to_owned(),
                    count: values.len() as u64,
                    average_sentiment,
                    sentiment_std: std_dev(values),
                    signal: KeywordSignal::interpret(keyword, average_sentiment),
                }
            })
            .collect();

        Some(Self {
            top_keywords,
            total_unique_keywords: first_seen.len(),
            trending: first_seen.iter().take(5).map(|&keyword| keyword.to_owned()).collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublisherBias {
    Bullish,
    Bearish,
    Balanced,
}

/// Confidence from volume alone: 10+ items high, 5+ medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublisherReliability {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublisherStats {
    pub publisher: String,
    pub item_count: u64,
    pub average_sentiment: f64,
    pub sentiment_std: f64,
    pub bias: PublisherBias,
    pub reliability: PublisherReliability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublisherAnalysis {
    /// Most active first.
    pub publishers: Vec<PublisherStats>,
    pub most_active: String,
    pub most_bullish: String,
    pub most_bearish: String,
}

impl PublisherAnalysis {
    /// `rows` must be ordered by item count, highest first.
    pub fn from_rows(rows: Vec<PublisherSentiment>) -> Option<Self> {
        let most_active = rows.first()?.publisher.clone();
        let most_bullish = first_extreme(&rows, |row| row.average_sentiment, |a, b| a > b)?
            .publisher
            .clone();
        let most_bearish = first_extreme(&rows, |row| row.average_sentiment, |a, b| a < b)?
            .publisher
            .clone();

        let publishers = rows
            .into_iter()
            .map(|row| PublisherStats {
                bias: if row.average_sentiment > 0.15 {
                    PublisherBias::Bullish
                } else if row.average_sentiment < -0.15 {
                    PublisherBias::Bearish
                } else {
                    PublisherBias::Balanced
                },
                reliability: match row.item_count {
                    10.. => PublisherReliability::High,
                    5..=9 => PublisherReliability::Medium,
                    _ => PublisherReliability::Low,
                },
                publisher: row.publisher,
                item_count: row.item_count,
                average_sentiment: row.average_sentiment,
                sentiment_std: row.sentiment_std,
            })
            .collect();

        Some(Self {
            publishers,
            most_active,
            most_bullish,
            most_bearish,
        })
    }
}

/// First row whose key beats every earlier one under `better`.
fn first_extreme<T>(
    rows: &[T],
    key: impl Fn(&T) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> Option<&T> {
    let mut rows = rows.iter();
    let mut best = rows.next()?;
    for row in rows {
        if better(key(row), key(best)) {
            best = row;
        }
    }
    Some(best)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let average = mean(values);
    let variance =
        values.iter().map(|value| (value - average).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(label: &str, average: f64, count: u64) -> DailySentiment {
        DailySentiment {
            day: label.to_owned(),
            average_sentiment: average,
            item_count: count,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn trend_compares_the_last_three_days_with_earlier_ones() {
        let trend = SentimentTrend::from_days(vec![
            day("2026-03-01", -0.2, 2),
            day("2026-03-02", 0.0, 1),
            day("2026-03-03", 0.1, 3),
            day("2026-03-04", 0.2, 1),
            day("2026-03-05", 0.3, 1),
        ])
        .expect("trend");

        assert_eq!(trend.direction, TrendDirection::Improving);
        assert!(close(trend.current_sentiment, 0.3));
        assert!(close(trend.max_sentiment, 0.3));
        assert!(close(trend.min_sentiment, -0.2));
        assert_eq!(trend.total_items, 8);
    }

    #[test]
    fn two_days_compare_last_with_first() {
        let declining =
            SentimentTrend::from_days(vec![day("2026-03-01", 0.4, 1), day("2026-03-02", 0.1, 1)])
                .expect("trend");
        assert_eq!(declining.direction, TrendDirection::Declining);
        assert!(close(declining.volatility, 0.15));

        let steady =
            SentimentTrend::from_days(vec![day("2026-03-01", 0.1, 1), day("2026-03-02", 0.14, 1)])
                .expect("trend");
        assert_eq!(steady.direction, TrendDirection::Neutral);
    }

    #[test]
    fn single_day_is_neutral_and_no_days_is_nothing() {
        let single = SentimentTrend::from_days(vec![day("2026-03-01", 0.9, 4)]).expect("trend");
        assert_eq!(single.direction, TrendDirection::Neutral);
        assert!(close(single.volatility, 0.0));
        assert_eq!(SentimentTrend::from_days(Vec::new()), None);
    }

    #[test]
    fn impact_is_weighted_by_category() {
        assert_eq!(MarketImpact::assess("monetary_policy", -0.5), MarketImpact::High);
        assert_eq!(MarketImpact::assess("general", -0.5), MarketImpact::Low);
        assert_eq!(MarketImpact::assess("geopolitical", 0.4), MarketImpact::Medium);
        assert_eq!(MarketImpact::assess("unclassified", 0.5), MarketImpact::Medium);
    }

    #[test]
    fn category_extremes_keep_the_first_on_ties() {
        let row = |category: &str, count: u64, average: f64| CategorySentiment {
            category: category.to_owned(),
            item_count: count,
            average_sentiment: average,
            max_sentiment: average + 0.1,
            min_sentiment: average - 0.1,
        };
        let analysis = CategoryAnalysis::from_rows(vec![
            row("market_movement", 5, 0.2),
            row("geopolitical", 3, -0.4),
            row("general", 2, 0.2),
        ])
        .expect("analysis");

        assert_eq!(analysis.most_covered, "market_movement");
        assert_eq!(analysis.most_positive, "market_movement");
        assert_eq!(analysis.most_negative, "geopolitical");
        assert!(close(analysis.categories[1].sentiment_range, 0.2));
        assert_eq!(CategoryAnalysis::from_rows(Vec::new()), None);
    }

    #[test]
    fn keyword_signals_depend_on_the_term() {
        assert_eq!(KeywordSignal::interpret("Fed", 0.3), KeywordSignal::StrongBullish);
        assert_eq!(KeywordSignal::interpret("inflation", -0.3), KeywordSignal::MixedSignal);
        assert_eq!(KeywordSignal::interpret("strong dollar", -0.3), KeywordSignal::StrongBearish);
        assert_eq!(KeywordSignal::interpret("rate hikes", 0.0), KeywordSignal::Bearish);
        assert_eq!(KeywordSignal::interpret("bullion", 0.25), KeywordSignal::Positive);
        assert_eq!(KeywordSignal::interpret("bullion", 0.15), KeywordSignal::Neutral);
    }

    #[test]
    fn keywords_rank_by_count_then_first_seen() {
        let rows = vec![
            ScoredKeywords {
                keywords: vec![String::from("miners"), String::from("fed")],
                sentiment_score: 0.4,
            },
            ScoredKeywords {
                keywords: vec![String::from("fed"), String::from("dollar")],
                sentiment_score: 0.0,
            },
        ];

        let analysis = KeywordAnalysis::from_rows(&rows, 2).expect("analysis");

        let ranked: Vec<_> = analysis
            .top_keywords
            .iter()
            .map(|stats| stats.keyword.as_str())
            .collect();
        assert_eq!(ranked, vec!["fed", "miners"]);
        assert_eq!(analysis.top_keywords[0].count, 2);
        assert!(close(analysis.top_keywords[0].average_sentiment, 0.2));
        assert!(close(analysis.top_keywords[0].sentiment_std, 0.2));
        assert_eq!(analysis.top_keywords[0].signal, KeywordSignal::StrongBullish);
        assert_eq!(analysis.total_unique_keywords, 3);
        assert_eq!(analysis.trending, vec!["miners", "fed", "dollar"]);
        assert_eq!(KeywordAnalysis::from_rows(&[], 5), None);
    }

    #[test]
    fn publishers_get_bias_and_reliability() {
        let row = |publisher: &str, count: u64, average: f64| PublisherSentiment {
            publisher: publisher.to_owned(),
            item_count: count,
            average_sentiment: average,
            sentiment_std: 0.1,
        };
        let analysis = PublisherAnalysis::from_rows(vec![
            row("Reuters", 12, 0.05),
            row("Kitco", 6, 0.3),
            row("Bloomberg", 2, -0.2),
        ])
        .expect("analysis");

        assert_eq!(analysis.most_active, "Reuters");
        assert_eq!(analysis.most_bullish, "Kitco");
        assert_eq!(analysis.most_bearish, "Bloomberg");
        let reuters = &analysis.publishers[0];
        assert_eq!(reuters.bias, PublisherBias::Balanced);
        assert_eq!(reuters.reliability, PublisherReliability::High);
        assert_eq!(analysis.publishers[1].reliability, PublisherReliability::Medium);
        assert_eq!(analysis.publishers[2].bias, PublisherBias::Bearish);
    }
}
