use core_types::DerivedStockRecord;

/// Case-insensitive substring lookup over record symbols.
///
/// The index stores a lowercased copy of every symbol, aligned with the positions of the
/// records it was built from, and answers with those positions.
#[derive(Debug, Clone, Default)]
pub struct SymbolSearchIndex {
    lowered: Vec<String>,
}

impl SymbolSearchIndex {
    pub fn build(records: &[DerivedStockRecord]) -> Self {
        Self {
            lowered: records.iter().map(|r| r.symbol.to_lowercase()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lowered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lowered.is_empty()
    }

    /// Positions of every record whose symbol contains `term`.
    pub fn search(&self, term: Option<&str>) -> Vec<usize> {
        self.search_within(term, 0..self.lowered.len())
    }

    /// Narrows `candidates` to those whose symbol contains `term`, keeping their order.
    ///
    /// An absent or blank term returns the candidates unchanged. Positions outside the
    /// index are dropped.
    pub fn search_within<I>(&self, term: Option<&str>, candidates: I) -> Vec<usize>
    where
        I: IntoIterator<Item = usize>,
    {
        let needle = match normalize(term) {
            Some(needle) => needle,
            None => return candidates.into_iter().filter(|&i| i < self.len()).collect(),
        };
        candidates
            .into_iter()
            .filter(|&i| self.lowered.get(i).is_some_and(|s| s.contains(&needle)))
            .collect()
    }
}

fn normalize(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{MarginSafety, Recommendation};
    use rust_decimal::Decimal;

    fn record(symbol: &str) -> DerivedStockRecord {
        DerivedStockRecord {
            symbol: symbol.to_string(),
            current_price: Decimal::ONE,
            margin_safety: MarginSafety::Safe,
            recommendation: Recommendation::Hold,
            predicted_return_5d: Decimal::ZERO,
            margin_call_probability: Decimal::ZERO,
            value_at_risk_95: Decimal::ZERO,
            volatility_20d: Decimal::ZERO,
            max_position_amount: Decimal::ZERO,
            max_shares: 0,
            margin_utilization_pct: Decimal::ZERO,
            risk_per_share: Decimal::ZERO,
            fundamental_strength: Decimal::ZERO,
            risk_adjusted_score: Decimal::ZERO,
            risk_adjusted_rank: 0,
        }
    }

    fn index() -> SymbolSearchIndex {
        SymbolSearchIndex::build(&[
            record("21STCENMGM.NS"),
            record("360ONE.NS"),
            record("3IINFOLTD.NS"),
            record("AAPL"),
        ])
    }

    #[test]
    fn matches_substrings_case_insensitively() {
        assert_eq!(index().search(Some("one")), vec![1]);
        assert_eq!(index().search(Some(".ns")), vec![0, 1, 2]);
        assert_eq!(index().search(Some("  aApL ")), vec![3]);
    }

    #[test]
    fn blank_term_returns_everything() {
        assert_eq!(index().search(None), vec![0, 1, 2, 3]);
        assert_eq!(index().search(Some("   ")), vec![0, 1, 2, 3]);
    }

    #[test]
    fn zero_matches_is_an_empty_result() {
        assert!(index().search(Some("ZZZ")).is_empty());
    }

    #[test]
    fn narrows_candidates_in_their_given_order() {
        assert_eq!(index().search_within(Some("3"), [2, 0, 1]), vec![2, 1]);
        assert_eq!(index().search_within(None, [3, 9, 1]), vec![3, 1]);
    }
}
