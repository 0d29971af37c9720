use crate::enums::{MarginSafety, Recommendation};
use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::Serialize;

/// The immutable per-stock input signals for one analysis snapshot.
///
/// `margin_call_probability` and `value_at_risk_95` are produced by the upstream
/// prediction model; whether they are used verbatim is up to the configured risk model.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStockObservation {
    pub symbol: String,
    pub current_price: Decimal,
    pub predicted_return_5d: Decimal,
    pub volatility_20d: Decimal,
    pub fundamental_strength: Decimal,
    pub margin_call_probability: Decimal,
    pub value_at_risk_95: Decimal,
}

impl RawStockObservation {
    /// Checks the well-formedness constraints every derivation relies on.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.symbol.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "Symbol".to_string(),
                "symbol must not be empty".to_string(),
            ));
        }
        if self.current_price <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "Current_Price".to_string(),
                format!("price must be positive, got {}", self.current_price),
            ));
        }
        if self.volatility_20d < Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "Volatility_20d".to_string(),
                format!("volatility must not be negative, got {}", self.volatility_20d),
            ));
        }
        if self.fundamental_strength < Decimal::ZERO || self.fundamental_strength > Decimal::ONE {
            return Err(CoreError::InvalidInput(
                "Fundamental_Strength".to_string(),
                format!("must lie in [0, 1], got {}", self.fundamental_strength),
            ));
        }
        Ok(())
    }
}

/// The full analytic record for one stock, as handed to the presentation layer.
///
/// Every field is a raw value; formatting is the consumer's concern. Field order and
/// serde names define the egress schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedStockRecord {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Current_Price")]
    pub current_price: Decimal,
    #[serde(rename = "Margin_Safety")]
    pub margin_safety: MarginSafety,
    #[serde(rename = "Recommendation")]
    pub recommendation: Recommendation,
    #[serde(rename = "Predicted_Return_5d")]
    pub predicted_return_5d: Decimal,
    #[serde(rename = "Margin_Call_Probability")]
    pub margin_call_probability: Decimal,
    #[serde(rename = "Value_at_Risk_95")]
    pub value_at_risk_95: Decimal,
    #[serde(rename = "Volatility_20d")]
    pub volatility_20d: Decimal,
    #[serde(rename = "Max_Position_$")]
    pub max_position_amount: Decimal,
    #[serde(rename = "Max_Shares")]
    pub max_shares: u64,
    #[serde(rename = "Margin_Utilization_%")]
    pub margin_utilization_pct: Decimal,
    #[serde(rename = "Risk_per_Share")]
    pub risk_per_share: Decimal,
    #[serde(rename = "Fundamental_Strength")]
    pub fundamental_strength: Decimal,
    #[serde(rename = "Risk_Adjusted_Score")]
    pub risk_adjusted_score: Decimal,
    /// 1 is best. Zero means the record has not been through a ranking pass yet.
    #[serde(rename = "Risk_Adjusted_Rank")]
    pub risk_adjusted_rank: u32,
}

impl DerivedStockRecord {
    pub fn is_ranked(&self) -> bool {
        self.risk_adjusted_rank > 0
    }
}
