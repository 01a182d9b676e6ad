use std::collections::BTreeSet;

const DEFAULT_POSITIVE: &[&str] = &[
    "surge", "surges", "surged", "rally", "rallies", "rallied", "rise", "rises", "rising", "gain",
    "gains", "up", "bullish", "strong", "high", "higher", "increase", "boost", "positive",
    "optimistic", "buy", "support",
];

const DEFAULT_NEGATIVE: &[&str] = &[
    "fall", "falls", "fell", "drop", "drops", "dropped", "decline", "declines", "down", "bearish",
    "weak", "low", "lower", "decrease", "crash", "negative", "pessimistic", "sell", "pressure",
    "slump",
];

/// Fixed positive/negative term lists for the lexical scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentLexicon {
    positive: BTreeSet<String>,
    negative: BTreeSet<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_POSITIVE.iter().copied(), DEFAULT_NEGATIVE.iter().copied())
    }
}

impl SentimentLexicon {
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            positive: positive
                .into_iter()
                .map(|term| term.as_ref().to_lowercase())
                .collect(),
            negative: negative
                .into_iter()
                .map(|term| term.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// `(positive - negative) / max(tokens / 10, 1)`, clamped to [-1, 1].
    ///
    /// `None` when there is nothing to score.
    pub fn score(&self, tokens: &[String]) -> Option<f64> {
        if tokens.is_empty() {
            return None;
        }

        let positive = tokens.iter().filter(|t| self.positive.contains(*t)).count();
        let negative = tokens.iter().filter(|t| self.negative.contains(*t)).count();
        let scale = (tokens.len() as f64 / 10.0).max(1.0);
        let raw = (positive as f64 - negative as f64) / scale;
        Some(raw.clamp(-1.0, 1.0))
    }
}
