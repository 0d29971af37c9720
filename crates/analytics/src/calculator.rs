use crate::error::AnalyticsError;
use configuration::{Config, PositionSizing, ScoringWeights};
use core_types::{DerivedStockRecord, MarginSafety, RawStockObservation, Recommendation};
use risk::{MarginRiskModel, PositionSizer, RiskError};
use rust_decimal::Decimal;

/// A stateless calculator for deriving margin metrics from one observation.
#[derive(Debug)]
pub struct MetricsCalculator {
    weights: ScoringWeights,
    sizer: PositionSizer,
    model: Box<dyn MarginRiskModel>,
}

impl MetricsCalculator {
    /// Builds a calculator from the application configuration, using the margin-risk
    /// model it selects.
    pub fn from_config(config: &Config) -> Result<Self, AnalyticsError> {
        let model = risk::model_from_settings(&config.margin_model).map_err(parameters)?;
        Self::with_model(
            config.scoring.clone(),
            config.position_sizing.clone(),
            model,
        )
    }

    /// Builds a calculator around an externally supplied margin-risk model.
    pub fn with_model(
        weights: ScoringWeights,
        sizing: PositionSizing,
        model: Box<dyn MarginRiskModel>,
    ) -> Result<Self, AnalyticsError> {
        if weights.risk_weight < Decimal::ZERO || weights.margin_call_weight < Decimal::ZERO {
            return Err(AnalyticsError::InvalidParameters(
                "scoring weights must not be negative".to_string(),
            ));
        }
        let sizer = PositionSizer::new(sizing).map_err(parameters)?;
        Ok(Self {
            weights,
            sizer,
            model,
        })
    }

    /// The main entry point: derives the full record for one observation.
    ///
    /// The returned record is unranked (`risk_adjusted_rank == 0`); ranks are a
    /// property of a collection, not of a single stock.
    ///
    /// # Errors
    ///
    /// `InvalidObservation` when the price is not positive, the volatility is negative or
    /// the fundamental strength lies outside `[0, 1]`; `Calculation` when the margin-risk
    /// model or the sizer cannot produce a value.
    pub fn derive(
        &self,
        observation: &RawStockObservation,
    ) -> Result<DerivedStockRecord, AnalyticsError> {
        observation
            .validate()
            .map_err(|e| AnalyticsError::InvalidObservation {
                symbol: observation.symbol.clone(),
                reason: e.to_string(),
            })?;

        let symbol = &observation.symbol;

        // VaR first: position sizing depends on it, and utilization depends on sizing.
        let value_at_risk_95 = self
            .model
            .value_at_risk(observation)
            .map_err(|e| calculation(symbol, e))?
            .max(Decimal::ZERO);

        let limits = self
            .sizer
            .size(observation.current_price, value_at_risk_95)
            .map_err(|e| calculation(symbol, e))?;

        let margin_call_probability = self
            .model
            .margin_call_probability(observation, limits.margin_utilization_pct)
            .map_err(|e| calculation(symbol, e))?
            .clamp(Decimal::ZERO, Decimal::ONE);

        let margin_safety = MarginSafety::from_probability(margin_call_probability);
        let risk_adjusted_score = self
            .score(observation.predicted_return_5d, value_at_risk_95, margin_call_probability)
            .ok_or_else(|| AnalyticsError::Calculation {
                symbol: symbol.clone(),
                reason: "risk-adjusted score overflowed".to_string(),
            })?;
        let recommendation = Recommendation::decide(margin_safety, risk_adjusted_score);

        tracing::debug!(
            symbol = %symbol,
            %margin_call_probability,
            %risk_adjusted_score,
            safety = %margin_safety,
            "Derived stock metrics."
        );

        Ok(DerivedStockRecord {
            symbol: symbol.clone(),
            current_price: observation.current_price,
            margin_safety,
            recommendation,
            predicted_return_5d: observation.predicted_return_5d,
            margin_call_probability,
            value_at_risk_95,
            volatility_20d: observation.volatility_20d,
            max_position_amount: limits.max_position_amount,
            max_shares: limits.max_shares,
            margin_utilization_pct: limits.margin_utilization_pct,
            risk_per_share: limits.risk_per_share,
            fundamental_strength: observation.fundamental_strength,
            risk_adjusted_score,
            risk_adjusted_rank: 0,
        })
    }

    /// `return - λ * risk_per_share_normalized - μ * margin_call_probability`.
    ///
    /// Risk per share divided by price is the VaR itself, so the VaR is used directly.
    /// `None` when a term leaves the `Decimal` range.
    fn score(
        &self,
        predicted_return_5d: Decimal,
        value_at_risk_95: Decimal,
        margin_call_probability: Decimal,
    ) -> Option<Decimal> {
        let risk_penalty = self.weights.risk_weight.checked_mul(value_at_risk_95)?;
        let call_penalty = self
            .weights
            .margin_call_weight
            .checked_mul(margin_call_probability)?;
        predicted_return_5d
            .checked_sub(risk_penalty)?
            .checked_sub(call_penalty)
    }
}

fn parameters(e: RiskError) -> AnalyticsError {
    AnalyticsError::InvalidParameters(e.to_string())
}

fn calculation(symbol: &str, e: RiskError) -> AnalyticsError {
    match e {
        RiskError::InvalidPrice(_) => AnalyticsError::InvalidObservation {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        },
        other => AnalyticsError::Calculation {
            symbol: symbol.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::MarginModelKind;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn calculator() -> MetricsCalculator {
        MetricsCalculator::from_config(&Config::default()).unwrap()
    }

    fn observation(symbol: &str, probability: Decimal) -> RawStockObservation {
        RawStockObservation {
            symbol: symbol.to_string(),
            current_price: dec!(100),
            predicted_return_5d: dec!(0.02),
            volatility_20d: dec!(0.01),
            fundamental_strength: dec!(0.9),
            margin_call_probability: probability,
            value_at_risk_95: dec!(0.0165),
        }
    }

    #[rstest]
    #[case::calm_positive(dec!(0.5), dec!(0.02), MarginSafety::Safe, Recommendation::BuyOnMargin)]
    #[case::warning_positive(dec!(0.65), dec!(0.02), MarginSafety::Warning, Recommendation::Hold)]
    #[case::danger_boundary(dec!(0.80), dec!(0.02), MarginSafety::Danger, Recommendation::AvoidMargin)]
    #[case::safe_negative(dec!(0.1), dec!(-0.05), MarginSafety::Safe, Recommendation::AvoidMargin)]
    fn bands_and_recommendations(
        #[case] probability: Decimal,
        #[case] predicted_return: Decimal,
        #[case] safety: MarginSafety,
        #[case] recommendation: Recommendation,
    ) {
        let mut obs = observation("AAA", probability);
        obs.predicted_return_5d = predicted_return;
        let record = calculator().derive(&obs).unwrap();
        assert_eq!(record.margin_safety, safety);
        assert_eq!(record.recommendation, recommendation);
        assert_eq!(record.risk_adjusted_rank, 0);
    }

    #[test]
    fn overflowing_score_is_a_calculation_error() {
        let weights = ScoringWeights {
            risk_weight: Decimal::MAX,
            margin_call_weight: dec!(0.01),
        };
        let calculator = MetricsCalculator::with_model(
            weights,
            PositionSizing::default(),
            Box::new(risk::UpstreamSignalModel),
        )
        .unwrap();
        let mut obs = observation("HUGE", dec!(0.5));
        obs.value_at_risk_95 = dec!(2);
        let err = calculator.derive(&obs).unwrap_err();
        assert!(matches!(err, AnalyticsError::Calculation { ref symbol, .. } if symbol == "HUGE"));
    }

    #[test]
    fn score_applies_configured_weights() {
        let record = calculator().derive(&observation("AAA", dec!(0.5))).unwrap();
        // 0.02 - 0.1 * 0.0165 - 0.01 * 0.5
        assert_eq!(record.risk_adjusted_score, dec!(0.01335));
    }

    #[test]
    fn derived_fields_are_consistent() {
        let record = calculator().derive(&observation("AAA", dec!(0.5))).unwrap();
        assert_eq!(record.risk_per_share, dec!(1.65));
        assert!(Decimal::from(record.max_shares) * record.current_price <= record.max_position_amount);
        assert_eq!(record.predicted_return_5d, dec!(0.02));
        assert_eq!(record.fundamental_strength, dec!(0.9));
    }

    #[test]
    fn rejects_malformed_observations() {
        let mut obs = observation("BAD", dec!(0.5));
        obs.current_price = dec!(-1);
        let err = calculator().derive(&obs).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidObservation { ref symbol, .. } if symbol == "BAD"));

        let mut obs = observation("BAD", dec!(0.5));
        obs.fundamental_strength = dec!(1.5);
        assert!(calculator().derive(&obs).is_err());

        let mut obs = observation("BAD", dec!(0.5));
        obs.volatility_20d = dec!(-0.2);
        assert!(calculator().derive(&obs).is_err());
    }

    #[test]
    fn parametric_model_ignores_upstream_signals() {
        let mut config = Config::default();
        config.margin_model.kind = MarginModelKind::Parametric;
        let calculator = MetricsCalculator::from_config(&config).unwrap();

        let a = calculator.derive(&observation("AAA", dec!(0.1))).unwrap();
        let b = calculator.derive(&observation("AAA", dec!(0.95))).unwrap();
        assert_eq!(a.margin_call_probability, b.margin_call_probability);
        assert!((a.value_at_risk_95 - dec!(0.01645)).abs() < dec!(0.0000001));
    }

    #[test]
    fn rejects_negative_weights() {
        let weights = ScoringWeights {
            risk_weight: dec!(-1),
            margin_call_weight: dec!(0.01),
        };
        let result = MetricsCalculator::with_model(
            weights,
            PositionSizing::default(),
            Box::new(risk::UpstreamSignalModel),
        );
        assert!(matches!(result, Err(AnalyticsError::InvalidParameters(_))));
    }

    proptest! {
        #[test]
        fn prop_derive_is_idempotent_and_respects_the_cap(
            price_cents in 1i64..5_000_000,
            return_bp in -500i64..500,
            vol_bp in 0i64..1_000,
            fund_pm in 0i64..=1_000,
            prob_pm in 0i64..=1_000,
            var_bp in 0i64..2_000,
        ) {
            let obs = RawStockObservation {
                symbol: "PROP".to_string(),
                current_price: Decimal::new(price_cents, 2),
                predicted_return_5d: Decimal::new(return_bp, 4),
                volatility_20d: Decimal::new(vol_bp, 4),
                fundamental_strength: Decimal::new(fund_pm, 3),
                margin_call_probability: Decimal::new(prob_pm, 3),
                value_at_risk_95: Decimal::new(var_bp, 4),
            };
            let calculator = calculator();
            let first = calculator.derive(&obs).unwrap();
            let second = calculator.derive(&obs).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(
                Decimal::from(first.max_shares) * first.current_price <= first.max_position_amount
            );
            prop_assert!(first.margin_call_probability >= Decimal::ZERO);
            prop_assert!(first.margin_call_probability <= Decimal::ONE);
            prop_assert!(first.value_at_risk_95 >= Decimal::ZERO);
            prop_assert!(first.risk_per_share >= Decimal::ZERO);
        }
    }
}
