use crate::error::AnalyzerError;
use core_types::DerivedStockRecord;
use rust_decimal::Decimal;
use serde::Serialize;

/// A headline figure together with the stock it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMetric<T> {
    pub symbol: String,
    pub value: T,
}

/// The key metrics shown above the full table.
///
/// Ties go to the record that appears first in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub best_ranked: SymbolMetric<u32>,
    pub lowest_risk_per_share: SymbolMetric<Decimal>,
    pub highest_predicted_return: SymbolMetric<Decimal>,
}

impl DatasetSummary {
    pub fn from_records(records: &[DerivedStockRecord]) -> Result<Self, AnalyzerError> {
        let best = records
            .iter()
            .filter(|r| r.is_ranked())
            .min_by_key(|r| r.risk_adjusted_rank)
            .ok_or(AnalyzerError::EmptyDataset)?;
        let safest = records
            .iter()
            .min_by_key(|r| r.risk_per_share)
            .ok_or(AnalyzerError::EmptyDataset)?;
        let strongest = records
            .iter()
            .reduce(|best, r| {
                if r.predicted_return_5d > best.predicted_return_5d {
                    r
                } else {
                    best
                }
            })
            .ok_or(AnalyzerError::EmptyDataset)?;

        Ok(Self {
            best_ranked: SymbolMetric {
                symbol: best.symbol.clone(),
                value: best.risk_adjusted_rank,
            },
            lowest_risk_per_share: SymbolMetric {
                symbol: safest.symbol.clone(),
                value: safest.risk_per_share,
            },
            highest_predicted_return: SymbolMetric {
                symbol: strongest.symbol.clone(),
                value: strongest.predicted_return_5d,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{MarginSafety, Recommendation};
    use rust_decimal_macros::dec;

    fn record(symbol: &str, rank: u32, risk_per_share: Decimal, ret: Decimal) -> DerivedStockRecord {
        DerivedStockRecord {
            symbol: symbol.to_string(),
            current_price: dec!(100),
            margin_safety: MarginSafety::Safe,
            recommendation: Recommendation::Hold,
            predicted_return_5d: ret,
            margin_call_probability: dec!(0.7),
            value_at_risk_95: dec!(0.03),
            volatility_20d: dec!(0.02),
            max_position_amount: dec!(250000),
            max_shares: 2500,
            margin_utilization_pct: dec!(50),
            risk_per_share,
            fundamental_strength: dec!(0.8),
            risk_adjusted_score: Decimal::ZERO,
            risk_adjusted_rank: rank,
        }
    }

    #[test]
    fn picks_headline_symbols() {
        let records = vec![
            record("21STCENMGM.NS", 3, dec!(1.768951364), dec!(0.013321424)),
            record("360ONE.NS", 12, dec!(46.98403909), dec!(-0.000390915)),
            record("3IINFOLTD.NS", 2, dec!(0.999270096), dec!(0.024416649)),
        ];
        let summary = DatasetSummary::from_records(&records).unwrap();
        assert_eq!(summary.best_ranked.symbol, "3IINFOLTD.NS");
        assert_eq!(summary.best_ranked.value, 2);
        assert_eq!(summary.lowest_risk_per_share.symbol, "3IINFOLTD.NS");
        assert_eq!(summary.highest_predicted_return.value, dec!(0.024416649));
    }

    #[test]
    fn ties_go_to_the_first_record() {
        let records = vec![
            record("AAA", 1, dec!(1), dec!(0.02)),
            record("BBB", 2, dec!(1), dec!(0.02)),
        ];
        let summary = DatasetSummary::from_records(&records).unwrap();
        assert_eq!(summary.lowest_risk_per_share.symbol, "AAA");
        assert_eq!(summary.highest_predicted_return.symbol, "AAA");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(
            DatasetSummary::from_records(&[]),
            Err(AnalyzerError::EmptyDataset)
        );
    }
}
