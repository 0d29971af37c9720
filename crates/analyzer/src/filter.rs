use core_types::{DerivedStockRecord, MarginSafety, Recommendation};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;

/// The structured filter options a caller can set on each interaction.
///
/// Every option is independent and AND-composed. `None` means "no restriction". A
/// present but empty set is an explicit choice and matches nothing. Ranges are
/// inclusive `[lo, hi]` pairs; an inverted range matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    pub safety_in: Option<HashSet<MarginSafety>>,
    pub recommendation_in: Option<HashSet<Recommendation>>,
    pub rank_range: Option<(u32, u32)>,
    pub price_range: Option<(Decimal, Decimal)>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn safety_in(mut self, values: impl IntoIterator<Item = MarginSafety>) -> Self {
        self.safety_in = Some(values.into_iter().collect());
        self
    }

    pub fn recommendation_in(mut self, values: impl IntoIterator<Item = Recommendation>) -> Self {
        self.recommendation_in = Some(values.into_iter().collect());
        self
    }

    pub fn rank_range(mut self, lo: u32, hi: u32) -> Self {
        self.rank_range = Some((lo, hi));
        self
    }

    pub fn price_range(mut self, lo: Decimal, hi: Decimal) -> Self {
        self.price_range = Some((lo, hi));
        self
    }

    /// Compiles the criteria into a reusable predicate.
    pub fn build(&self) -> RecordPredicate {
        let mut clauses = Vec::new();
        if let Some(set) = &self.safety_in {
            clauses.push(Clause::SafetyIn(set.clone()));
        }
        if let Some(set) = &self.recommendation_in {
            clauses.push(Clause::RecommendationIn(set.clone()));
        }
        if let Some((lo, hi)) = self.rank_range {
            clauses.push(Clause::RankRange(lo, hi));
        }
        if let Some((lo, hi)) = self.price_range {
            clauses.push(Clause::PriceRange(lo, hi));
        }
        RecordPredicate { clauses }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    SafetyIn(HashSet<MarginSafety>),
    RecommendationIn(HashSet<Recommendation>),
    RankRange(u32, u32),
    PriceRange(Decimal, Decimal),
}

impl Clause {
    fn matches(&self, record: &DerivedStockRecord) -> bool {
        match self {
            Clause::SafetyIn(set) => set.contains(&record.margin_safety),
            Clause::RecommendationIn(set) => set.contains(&record.recommendation),
            Clause::RankRange(lo, hi) => {
                *lo <= record.risk_adjusted_rank && record.risk_adjusted_rank <= *hi
            }
            Clause::PriceRange(lo, hi) => *lo <= record.current_price && record.current_price <= *hi,
        }
    }
}

/// A pure inclusion test over derived records: the conjunction of its clauses.
///
/// A predicate without clauses accepts every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPredicate {
    clauses: Vec<Clause>,
}

impl RecordPredicate {
    pub fn matches(&self, record: &DerivedStockRecord) -> bool {
        self.clauses.iter().all(|clause| clause.matches(record))
    }

    /// The conjunction of two predicates.
    pub fn and(mut self, other: RecordPredicate) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn record(safety: MarginSafety, recommendation: Recommendation, rank: u32, price: Decimal) -> DerivedStockRecord {
        DerivedStockRecord {
            symbol: format!("R{}", rank),
            current_price: price,
            margin_safety: safety,
            recommendation,
            predicted_return_5d: dec!(0.01),
            margin_call_probability: dec!(0.3),
            value_at_risk_95: dec!(0.03),
            volatility_20d: dec!(0.015),
            max_position_amount: dec!(300000),
            max_shares: 10,
            margin_utilization_pct: dec!(60),
            risk_per_share: dec!(1),
            fundamental_strength: dec!(0.8),
            risk_adjusted_score: dec!(0.004),
            risk_adjusted_rank: rank,
        }
    }

    fn sample() -> DerivedStockRecord {
        record(MarginSafety::Safe, Recommendation::BuyOnMargin, 3, dec!(58.74))
    }

    #[test]
    fn omitted_options_accept_everything() {
        let predicate = FilterCriteria::new().build();
        assert!(predicate.is_unrestricted());
        assert!(predicate.matches(&sample()));
    }

    #[test]
    fn explicitly_empty_set_matches_nothing() {
        let predicate = FilterCriteria::new().safety_in([]).build();
        assert!(!predicate.matches(&sample()));
    }

    #[rstest]
    #[case(FilterCriteria::new().safety_in([MarginSafety::Safe, MarginSafety::Warning]), true)]
    #[case(FilterCriteria::new().safety_in([MarginSafety::Danger]), false)]
    #[case(FilterCriteria::new().recommendation_in([Recommendation::BuyOnMargin]), true)]
    #[case(FilterCriteria::new().recommendation_in([Recommendation::Hold]), false)]
    #[case(FilterCriteria::new().rank_range(3, 3), true)]
    #[case(FilterCriteria::new().rank_range(1, 2), false)]
    #[case(FilterCriteria::new().rank_range(5, 1), false)]
    #[case(FilterCriteria::new().price_range(dec!(58.74), dec!(100)), true)]
    #[case(FilterCriteria::new().price_range(dec!(0), dec!(58.73)), false)]
    fn single_options(#[case] criteria: FilterCriteria, #[case] expected: bool) {
        assert_eq!(criteria.build().matches(&sample()), expected);
    }

    #[test]
    fn options_are_and_composed() {
        let criteria = FilterCriteria::new()
            .safety_in([MarginSafety::Safe])
            .price_range(dec!(100), dec!(200));
        assert!(!criteria.build().matches(&sample()));
    }

    #[test]
    fn and_narrows_the_predicate() {
        let broad = FilterCriteria::new().safety_in([MarginSafety::Safe]).build();
        let narrow = broad.clone().and(FilterCriteria::new().rank_range(1, 2).build());
        assert!(broad.matches(&sample()));
        assert!(!narrow.matches(&sample()));
    }

    #[test]
    fn deserializes_from_camel_case_options() {
        let criteria: FilterCriteria = serde_json::from_str(
            r#"{"safetyIn": ["Safe"], "recommendationIn": ["Buy on Margin"], "rankRange": [1, 10]}"#,
        )
        .unwrap();
        assert_eq!(
            criteria,
            FilterCriteria::new()
                .safety_in([MarginSafety::Safe])
                .recommendation_in([Recommendation::BuyOnMargin])
                .rank_range(1, 10)
        );
        assert!(criteria.price_range.is_none());
    }

    #[test]
    fn null_option_is_no_restriction_but_empty_list_is_explicit() {
        let open: FilterCriteria = serde_json::from_str(r#"{"safetyIn": null}"#).unwrap();
        assert!(open.build().matches(&sample()));

        let closed: FilterCriteria = serde_json::from_str(r#"{"safetyIn": []}"#).unwrap();
        assert!(!closed.build().matches(&sample()));
    }
}
