use crate::error::RiskError;
use configuration::PositionSizing;
use rust_decimal::prelude::*;

/// The position limits implied by the risk budget for one stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionLimits {
    pub max_position_amount: Decimal,
    pub max_shares: u64,
    /// Share of available margin the position consumes, in `[0, 100]`.
    pub margin_utilization_pct: Decimal,
    pub risk_per_share: Decimal,
}

/// Sizes positions so the 95% loss never exceeds a fixed fraction of capital.
///
/// The cap is `risk_budget / var_95`, clamped to the per-name ceiling.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    params: PositionSizing,
}

impl PositionSizer {
    /// Creates a new `PositionSizer` with the given configuration parameters.
    pub fn new(params: PositionSizing) -> Result<Self, RiskError> {
        // Validate that sizing parameters are logical.
        if params.total_capital <= Decimal::ZERO {
            return Err(RiskError::InvalidParameters(
                "total_capital must be greater than 0".to_string(),
            ));
        }
        if params.available_margin <= Decimal::ZERO {
            return Err(RiskError::InvalidParameters(
                "available_margin must be greater than 0".to_string(),
            ));
        }
        if params.risk_budget_pct <= Decimal::ZERO || params.risk_budget_pct > Decimal::ONE {
            return Err(RiskError::InvalidParameters(
                "risk_budget_pct must be between 0 and 1".to_string(),
            ));
        }
        if params.max_position_pct <= Decimal::ZERO || params.max_position_pct > Decimal::ONE {
            return Err(RiskError::InvalidParameters(
                "max_position_pct must be between 0 and 1".to_string(),
            ));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &PositionSizing {
        &self.params
    }

    /// Computes the position limits for a stock at `price` with fractional loss `var_95`.
    pub fn size(&self, price: Decimal, var_95: Decimal) -> Result<PositionLimits, RiskError> {
        // --- 1. Validation ---
        if price <= Decimal::ZERO {
            return Err(RiskError::InvalidPrice(price));
        }
        let var_95 = var_95.max(Decimal::ZERO);

        // --- 2. Risk-budget cap, clamped to the per-name ceiling ---
        // A zero VaR, or one so small the quotient overflows, leaves only the ceiling.
        let ceiling = self.params.position_ceiling();
        let max_position_amount = if var_95.is_zero() {
            ceiling
        } else {
            self.params
                .risk_budget()
                .checked_div(var_95)
                .map_or(ceiling, |budget_cap| budget_cap.min(ceiling))
        };

        // --- 3. Whole shares that fit under the cap ---
        let max_shares = whole_shares(max_position_amount, price)?;

        // --- 4. Utilization and per-share risk ---
        let margin_utilization_pct = (max_position_amount / self.params.available_margin
            * Decimal::ONE_HUNDRED)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);

        let risk_per_share = price.checked_mul(var_95).ok_or_else(|| {
            RiskError::Calculation(format!(
                "Risk per share for price {} at VaR {} overflowed",
                price, var_95
            ))
        })?;

        tracing::trace!(
            %price,
            %var_95,
            %max_position_amount,
            max_shares,
            "Position sized."
        );

        Ok(PositionLimits {
            max_position_amount,
            max_shares,
            margin_utilization_pct,
            risk_per_share,
        })
    }
}

/// `floor(amount / price)`, corrected so that `shares * price <= amount` holds exactly
/// even when the quotient was rounded up in its last digit.
fn whole_shares(amount: Decimal, price: Decimal) -> Result<u64, RiskError> {
    let quotient = amount.checked_div(price).ok_or_else(|| {
        RiskError::Calculation(format!("Position {} / price {} overflowed", amount, price))
    })?;

    let mut shares = quotient.floor().to_u64().ok_or_else(|| {
        RiskError::Calculation(format!("Share count {} is out of range", quotient.floor()))
    })?;

    while shares > 0 && Decimal::from(shares) * price > amount {
        shares -= 1;
    }
    Ok(shares)
}
