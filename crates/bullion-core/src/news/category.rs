use crate::NewsCategory;

const MONETARY_POLICY: &[&str] = &[
    "fed",
    "federal reserve",
    "interest rate",
    "interest rates",
    "monetary policy",
    "rate cut",
    "rate hike",
    "central bank",
    "fomc",
];
const GEOPOLITICAL: &[&str] = &[
    "geopolitical",
    "war",
    "crisis",
    "tension",
    "tensions",
    "sanctions",
    "conflict",
];
const ECONOMIC_DATA: &[&str] = &[
    "economic",
    "gdp",
    "employment",
    "unemployment",
    "inflation",
    "cpi",
    "payrolls",
];
const SUPPLY_DEMAND: &[&str] = &["mining", "production", "supply", "demand", "mine output"];
const MARKET_MOVEMENT: &[&str] = &["trading", "price", "prices", "market", "rally", "drop"];

/// Term lists per category, checked in [`NewsCategory::PRIORITY`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRules {
    rules: Vec<(NewsCategory, Vec<String>)>,
}

impl Default for CategoryRules {
    fn default() -> Self {
        let table = [
            (NewsCategory::MonetaryPolicy, MONETARY_POLICY),
            (NewsCategory::Geopolitical, GEOPOLITICAL),
            (NewsCategory::EconomicData, ECONOMIC_DATA),
            (NewsCategory::SupplyDemand, SUPPLY_DEMAND),
            (NewsCategory::MarketMovement, MARKET_MOVEMENT),
        ];
        Self::new(table.map(|(category, terms)| (category, terms.iter().copied())))
    }
}

impl CategoryRules {
    /// Rules are re-sorted into priority order; terms may be phrases.
    pub fn new<I, T>(rules: I) -> Self
    where
        I: IntoIterator<Item = (NewsCategory, T)>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let mut rules: Vec<(NewsCategory, Vec<String>)> = rules
            .into_iter()
            .map(|(category, terms)| {
                let terms = terms
                    .into_iter()
                    .map(|term| padded(&super::tokenize(term.as_ref())))
                    .filter(|term| !term.trim().is_empty())
                    .collect();
                (category, terms)
            })
            .collect();
        rules.sort_by_key(|(category, _)| priority(*category));
        Self { rules }
    }

    /// First category with a whole-word match, else `general`.
    pub fn classify(&self, tokens: &[String]) -> NewsCategory {
        let text = padded(tokens);
        self.rules
            .iter()
            .find(|(_, terms)| terms.iter().any(|term| text.contains(term.as_str())))
            .map_or(NewsCategory::General, |(category, _)| *category)
    }
}

fn priority(category: NewsCategory) -> usize {
    NewsCategory::PRIORITY
        .iter()
        .position(|candidate| *candidate == category)
        .unwrap_or(NewsCategory::PRIORITY.len())
}

/// `" a b c "`, so `contains(" b ")` only matches whole tokens.
fn padded(tokens: &[String]) -> String {
    format!(" {} ", tokens.join(" "))
}
