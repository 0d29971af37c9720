use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section is optional in the file; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub position_sizing: PositionSizing,
    #[serde(default)]
    pub margin_model: MarginModelSettings,
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Config {
    /// Rejects parameter combinations the metrics engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.scoring;
        if w.risk_weight < Decimal::ZERO || w.margin_call_weight < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "scoring weights must not be negative".to_string(),
            ));
        }

        let p = &self.position_sizing;
        if p.total_capital <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "position_sizing.total_capital must be greater than 0".to_string(),
            ));
        }
        if p.available_margin <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "position_sizing.available_margin must be greater than 0".to_string(),
            ));
        }
        if p.risk_budget_pct <= Decimal::ZERO || p.risk_budget_pct > Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "position_sizing.risk_budget_pct must be in (0, 1]".to_string(),
            ));
        }
        if p.max_position_pct <= Decimal::ZERO || p.max_position_pct > Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "position_sizing.max_position_pct must be in (0, 1]".to_string(),
            ));
        }

        let m = &self.margin_model;
        if m.confidence_z <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "margin_model.confidence_z must be greater than 0".to_string(),
            ));
        }
        if m.horizon_days == 0 {
            return Err(ConfigError::ValidationError(
                "margin_model.horizon_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Weights of the two risk penalties in the risk-adjusted score.
///
/// `score = predicted_return_5d - risk_weight * var_95 - margin_call_weight * margin_call_probability`
///
/// The penalties are not normalized again in the calculator: the default weights already
/// carry the scaling that puts both terms on the scale of a 5-day return.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Penalty per unit of normalized risk per share (λ).
    pub risk_weight: Decimal,
    /// Penalty per unit of margin-call probability (μ).
    pub margin_call_weight: Decimal,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            risk_weight: dec!(0.1),
            margin_call_weight: dec!(0.01),
        }
    }
}

/// Capital and margin figures that drive the risk-budget position cap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PositionSizing {
    /// Total trading capital in account currency.
    pub total_capital: Decimal,
    /// Fraction of total capital that a single position may lose at 95% confidence.
    pub risk_budget_pct: Decimal,
    /// Margin (buying power) available for new positions.
    pub available_margin: Decimal,
    /// Ceiling on a single position, as a fraction of available margin.
    pub max_position_pct: Decimal,
}

impl PositionSizing {
    /// The maximum tolerated loss on one position.
    pub fn risk_budget(&self) -> Decimal {
        self.total_capital * self.risk_budget_pct
    }

    /// The largest allocation any single name may receive.
    pub fn position_ceiling(&self) -> Decimal {
        self.available_margin * self.max_position_pct
    }
}

impl Default for PositionSizing {
    fn default() -> Self {
        Self {
            total_capital: dec!(500000),
            risk_budget_pct: dec!(0.02),
            available_margin: dec!(500000),
            max_position_pct: Decimal::ONE,
        }
    }
}

/// Which margin-risk model supplies VaR and margin-call probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum MarginModelKind {
    /// Use the values produced by the upstream prediction model.
    #[default]
    Upstream,
    /// Compute both values from volatility, utilization and fundamentals.
    Parametric,
}

/// Parameters of the margin-risk model.
///
/// The coefficients are only read by the parametric model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarginModelSettings {
    pub kind: MarginModelKind,
    /// One-sided normal quantile for the VaR confidence level (1.645 for 95%).
    pub confidence_z: Decimal,
    pub horizon_days: u32,
    pub intercept: Decimal,
    pub volatility_coef: Decimal,
    /// Applied to utilization expressed as a fraction (0..=1).
    pub utilization_coef: Decimal,
    pub fundamental_coef: Decimal,
}

impl Default for MarginModelSettings {
    fn default() -> Self {
        Self {
            kind: MarginModelKind::Upstream,
            confidence_z: dec!(1.645),
            horizon_days: 1,
            intercept: dec!(-2.0),
            volatility_coef: dec!(40),
            utilization_coef: dec!(2),
            fundamental_coef: dec!(1.5),
        }
    }
}

/// What a load does with an observation that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BadRecordPolicy {
    /// Install the valid records and report the rejected ones.
    #[default]
    Skip,
    /// Abort the whole load on the first invalid record.
    RejectLoad,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetSettings {
    #[serde(default)]
    pub bad_record_policy: BadRecordPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "marginscope.log".to_string(),
        }
    }
}
