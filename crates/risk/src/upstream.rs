use crate::error::RiskError;
use crate::MarginRiskModel;
use core_types::RawStockObservation;
use rust_decimal::Decimal;

/// Passes through the figures the upstream prediction model attached to each observation.
///
/// Out-of-range values are clamped: probability into `[0, 1]`, VaR to `>= 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpstreamSignalModel;

impl MarginRiskModel for UpstreamSignalModel {
    fn value_at_risk(&self, observation: &RawStockObservation) -> Result<Decimal, RiskError> {
        Ok(observation.value_at_risk_95.max(Decimal::ZERO))
    }

    fn margin_call_probability(
        &self,
        observation: &RawStockObservation,
        _margin_utilization_pct: Decimal,
    ) -> Result<Decimal, RiskError> {
        Ok(observation
            .margin_call_probability
            .clamp(Decimal::ZERO, Decimal::ONE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn observation(probability: Decimal, var: Decimal) -> RawStockObservation {
        RawStockObservation {
            symbol: "360ONE.NS".to_string(),
            current_price: dec!(1171.800049),
            predicted_return_5d: dec!(-0.000390915),
            volatility_20d: dec!(0.023221702),
            fundamental_strength: dec!(0.81975),
            margin_call_probability: probability,
            value_at_risk_95: var,
        }
    }

    #[test]
    fn passes_through_in_range_values() {
        let obs = observation(dec!(0.738503651), dec!(0.040095611));
        let model = UpstreamSignalModel;
        assert_eq!(model.value_at_risk(&obs).unwrap(), dec!(0.040095611));
        assert_eq!(
            model.margin_call_probability(&obs, dec!(49.9)).unwrap(),
            dec!(0.738503651)
        );
    }

    #[test]
    fn clamps_out_of_range_signals() {
        let obs = observation(dec!(1.2), dec!(-0.01));
        let model = UpstreamSignalModel;
        assert_eq!(model.value_at_risk(&obs).unwrap(), Decimal::ZERO);
        assert_eq!(model.margin_call_probability(&obs, dec!(10)).unwrap(), Decimal::ONE);

        let obs = observation(dec!(-0.3), dec!(0.02));
        assert_eq!(model.margin_call_probability(&obs, dec!(10)).unwrap(), Decimal::ZERO);
    }
}
