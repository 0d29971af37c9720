use crate::error::RiskError;
use crate::MarginRiskModel;
use configuration::MarginModelSettings;
use core_types::RawStockObservation;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Logits are clamped to this magnitude before exponentiation; beyond it the
/// probability is indistinguishable from 0 or 1 at `Decimal` precision anyway.
const MAX_LOGIT: Decimal = dec!(30);

/// A closed-form stand-in for a calibrated margin model.
///
/// - VaR is the normal approximation `z * volatility * sqrt(horizon_days)`.
/// - Margin-call probability is a logistic function of volatility, utilization and
///   fundamental strength: increasing in the first two, decreasing in the third.
#[derive(Debug, Clone)]
pub struct ParametricMarginModel {
    params: MarginModelSettings,
    horizon_scale: Decimal,
}

impl ParametricMarginModel {
    pub fn new(params: MarginModelSettings) -> Result<Self, RiskError> {
        if params.confidence_z <= Decimal::ZERO {
            return Err(RiskError::InvalidParameters(
                "confidence_z must be greater than 0".to_string(),
            ));
        }
        if params.horizon_days == 0 {
            return Err(RiskError::InvalidParameters(
                "horizon_days must be at least 1".to_string(),
            ));
        }
        if params.volatility_coef < Decimal::ZERO
            || params.utilization_coef < Decimal::ZERO
            || params.fundamental_coef < Decimal::ZERO
        {
            return Err(RiskError::InvalidParameters(
                "model coefficients must not be negative".to_string(),
            ));
        }

        let horizon_scale = Decimal::from(params.horizon_days).sqrt().ok_or_else(|| {
            RiskError::Calculation("Failed to calculate square root of the horizon".to_string())
        })?;

        Ok(Self {
            params,
            horizon_scale,
        })
    }
}

impl MarginRiskModel for ParametricMarginModel {
    fn value_at_risk(&self, observation: &RawStockObservation) -> Result<Decimal, RiskError> {
        self.params
            .confidence_z
            .checked_mul(observation.volatility_20d)
            .and_then(|v| v.checked_mul(self.horizon_scale))
            .ok_or_else(|| {
                RiskError::Calculation(format!(
                    "VaR for volatility {} overflowed",
                    observation.volatility_20d
                ))
            })
    }

    fn margin_call_probability(
        &self,
        observation: &RawStockObservation,
        margin_utilization_pct: Decimal,
    ) -> Result<Decimal, RiskError> {
        let p = &self.params;
        let utilization = margin_utilization_pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            / Decimal::ONE_HUNDRED;

        let logit = p
            .volatility_coef
            .checked_mul(observation.volatility_20d)
            .and_then(|v| p.intercept.checked_add(v))
            .and_then(|l| p.utilization_coef.checked_mul(utilization).and_then(|u| l.checked_add(u)))
            .and_then(|l| {
                p.fundamental_coef
                    .checked_mul(observation.fundamental_strength)
                    .and_then(|f| l.checked_sub(f))
            })
            .ok_or_else(|| {
                RiskError::Calculation(format!(
                    "Margin-call logit for volatility {} overflowed",
                    observation.volatility_20d
                ))
            })?;

        logistic(logit.clamp(-MAX_LOGIT, MAX_LOGIT))
    }
}

/// `1 / (1 + e^-x)`, evaluated with a non-negative exponent on both sides of zero.
fn logistic(x: Decimal) -> Result<Decimal, RiskError> {
    let e = x.abs().checked_exp().ok_or_else(|| {
        RiskError::Calculation(format!("Failed to exponentiate logit {}", x))
    })?;

    let probability = if x.is_sign_negative() {
        Decimal::ONE / (Decimal::ONE + e)
    } else {
        e / (Decimal::ONE + e)
    };
    Ok(probability.clamp(Decimal::ZERO, Decimal::ONE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn model() -> ParametricMarginModel {
        ParametricMarginModel::new(MarginModelSettings::default()).unwrap()
    }

    fn observation(volatility: Decimal, fundamental: Decimal) -> RawStockObservation {
        RawStockObservation {
            symbol: "AAA".to_string(),
            current_price: dec!(100),
            predicted_return_5d: dec!(0.02),
            volatility_20d: volatility,
            fundamental_strength: fundamental,
            margin_call_probability: Decimal::ZERO,
            value_at_risk_95: Decimal::ZERO,
        }
    }

    #[test]
    fn var_scales_with_confidence_and_horizon() {
        let obs = observation(dec!(0.02), dec!(0.5));
        let one_day = model().value_at_risk(&obs).unwrap();
        assert!((one_day - dec!(0.0329)).abs() < dec!(0.0000001));

        let mut settings = MarginModelSettings::default();
        settings.horizon_days = 4;
        let four_day = ParametricMarginModel::new(settings).unwrap();
        let var = four_day.value_at_risk(&obs).unwrap();
        assert!((var - dec!(0.0658)).abs() < dec!(0.0000001));
    }

    #[test]
    fn extreme_volatility_is_a_calculation_error() {
        let obs = observation(Decimal::MAX, dec!(0.5));
        let m = model();
        assert!(matches!(m.value_at_risk(&obs), Err(RiskError::Calculation(_))));
        assert!(matches!(
            m.margin_call_probability(&obs, dec!(50)),
            Err(RiskError::Calculation(_))
        ));
    }

    #[test]
    fn logistic_is_centred_at_one_half() {
        assert_eq!(logistic(Decimal::ZERO).unwrap(), dec!(0.5));
    }

    #[test]
    fn calm_strong_stock_is_unlikely_to_be_called() {
        let obs = observation(dec!(0.01), dec!(0.9));
        let p = model().margin_call_probability(&obs, dec!(50)).unwrap();
        assert!(p < dec!(0.6), "expected a Safe-band probability, got {}", p);
    }

    #[test]
    fn rejects_zero_horizon() {
        let mut settings = MarginModelSettings::default();
        settings.horizon_days = 0;
        assert!(matches!(
            ParametricMarginModel::new(settings),
            Err(RiskError::InvalidParameters(_))
        ));
    }

    fn unit() -> impl Strategy<Value = Decimal> {
        (0u32..=1000).prop_map(|n| Decimal::from(n) / dec!(1000))
    }

    proptest! {
        #[test]
        fn prop_probability_stays_in_unit_interval(
            vol in unit(),
            fund in unit(),
            util in (0u32..=100).prop_map(Decimal::from),
        ) {
            let p = model().margin_call_probability(&observation(vol, fund), util).unwrap();
            prop_assert!(p >= Decimal::ZERO && p <= Decimal::ONE);
        }

        #[test]
        fn prop_probability_rises_with_volatility(
            vol in (0u32..=500).prop_map(|n| Decimal::from(n) / dec!(1000)),
            bump in 1u32..500,
            fund in unit(),
        ) {
            let higher = vol + Decimal::from(bump) / dec!(1000);
            let m = model();
            let low = m.margin_call_probability(&observation(vol, fund), dec!(50)).unwrap();
            let high = m.margin_call_probability(&observation(higher, fund), dec!(50)).unwrap();
            prop_assert!(high >= low);
        }

        #[test]
        fn prop_probability_rises_with_utilization(
            util in 0u32..100,
            vol in unit(),
            fund in unit(),
        ) {
            let m = model();
            let obs = observation(vol, fund);
            let low = m.margin_call_probability(&obs, Decimal::from(util)).unwrap();
            let high = m.margin_call_probability(&obs, Decimal::from(util + 1)).unwrap();
            prop_assert!(high >= low);
        }

        #[test]
        fn prop_probability_falls_with_fundamentals(
            fund in 0u32..1000,
            vol in unit(),
        ) {
            let m = model();
            let weak = observation(vol, Decimal::from(fund) / dec!(1000));
            let strong = observation(vol, Decimal::from(fund + 1) / dec!(1000));
            let p_weak = m.margin_call_probability(&weak, dec!(50)).unwrap();
            let p_strong = m.margin_call_probability(&strong, dec!(50)).unwrap();
            prop_assert!(p_strong <= p_weak);
        }
    }
}
