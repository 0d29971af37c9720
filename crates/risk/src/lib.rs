//! # Marginscope Risk
//!
//! Position sizing under a fixed risk budget, and the seam through which a margin-risk
//! model supplies value-at-risk and margin-call probability.
//!
//! The statistical model behind those two figures lives outside this workspace. The
//! metrics calculator only ever talks to a `MarginRiskModel`, so a calibrated model can be
//! injected without touching the derivation pipeline.

use configuration::{MarginModelKind, MarginModelSettings};
use core_types::RawStockObservation;
use rust_decimal::Decimal;
use std::fmt::Debug;

pub mod error;
pub mod parametric;
pub mod sizing;
pub mod upstream;

pub use error::RiskError;
pub use parametric::ParametricMarginModel;
pub use sizing::{PositionLimits, PositionSizer};
pub use upstream::UpstreamSignalModel;

/// Supplies the two model-driven risk figures for one observation.
///
/// Implementations must be pure: the same inputs always produce the same outputs.
pub trait MarginRiskModel: Debug + Send + Sync {
    /// Fractional loss at 95% confidence over the model's horizon. Never negative.
    fn value_at_risk(&self, observation: &RawStockObservation) -> Result<Decimal, RiskError>;

    /// Probability in `[0, 1]` that a position sized at `margin_utilization_pct`
    /// (0..=100) triggers a margin call.
    fn margin_call_probability(
        &self,
        observation: &RawStockObservation,
        margin_utilization_pct: Decimal,
    ) -> Result<Decimal, RiskError>;
}

/// Builds the model selected in the configuration.
pub fn model_from_settings(
    settings: &MarginModelSettings,
) -> Result<Box<dyn MarginRiskModel>, RiskError> {
    match settings.kind {
        MarginModelKind::Upstream => Ok(Box::new(UpstreamSignalModel)),
        MarginModelKind::Parametric => Ok(Box::new(ParametricMarginModel::new(settings.clone())?)),
    }
}
