use std::collections::HashMap;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him",
    "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "may", "me", "might", "more",
    "most", "much", "must", "my", "new", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "out", "over", "own", "said", "same", "says", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "year", "you", "your",
];

/// Top `limit` terms by frequency; ties keep first-occurrence order.
///
/// Stopwords, single characters and bare numbers are skipped.
pub fn extract_keywords(tokens: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, token) in tokens.iter().enumerate() {
        if !is_candidate(token) {
            continue;
        }
        counts.entry(token.as_str()).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });
    ranked
        .into_iter()
        .take(limit)
        .map(|(term, _)| term.to_owned())
        .collect()
}

fn is_candidate(token: &str) -> bool {
    token.chars().count() >= 2
        && !token.chars().all(|ch| ch.is_ascii_digit())
        && !STOPWORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::tokenize;

    #[test]
    fn ranks_by_frequency_then_first_occurrence() {
        let tokens = tokenize(
            "Gold climbs as the dollar slips; gold miners follow gold, dollar bears cheer 2026",
        );
        assert_eq!(
            extract_keywords(&tokens, 4),
            vec!["gold", "dollar", "climbs", "slips"]
        );
    }

    #[test]
    fn limit_zero_yields_nothing() {
        assert!(extract_keywords(&tokenize("gold gold gold"), 0).is_empty());
    }
}
