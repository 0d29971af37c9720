use crate::error::CoreError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Margin-call probability at or above which a stock is classified as `Danger`.
pub const DANGER_THRESHOLD: Decimal = dec!(0.80);
/// Margin-call probability at or above which a stock is classified as `Warning`.
pub const WARNING_THRESHOLD: Decimal = dec!(0.60);

/// How safe a stock is to hold on margin.
///
/// Variants are declared from safest to riskiest so the derived `Ord` follows risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarginSafety {
    Safe,
    Warning,
    Danger,
}

impl MarginSafety {
    /// Classifies a margin-call probability into its band.
    ///
    /// Bands are inclusive on the danger side: exactly `0.80` is `Danger`,
    /// exactly `0.60` is `Warning`.
    pub fn from_probability(probability: Decimal) -> Self {
        if probability >= DANGER_THRESHOLD {
            MarginSafety::Danger
        } else if probability >= WARNING_THRESHOLD {
            MarginSafety::Warning
        } else {
            MarginSafety::Safe
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarginSafety::Safe => "Safe",
            MarginSafety::Warning => "Warning",
            MarginSafety::Danger => "Danger",
        }
    }
}

impl fmt::Display for MarginSafety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MarginSafety {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "safe" => Ok(MarginSafety::Safe),
            "warning" => Ok(MarginSafety::Warning),
            "danger" => Ok(MarginSafety::Danger),
            _ => Err(CoreError::UnknownVariant {
                kind: "margin safety",
                value: s.to_string(),
            }),
        }
    }
}

/// The trading recommendation attached to a derived record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Buy on Margin")]
    BuyOnMargin,
    #[serde(rename = "Avoid Margin")]
    AvoidMargin,
    Hold,
}

impl Recommendation {
    /// Combines the safety band and the risk-adjusted score into a recommendation.
    ///
    /// `Danger` or a negative score always yields `AvoidMargin`, even for a `Safe` stock.
    /// Only a `Safe` stock with a strictly positive score is bought on margin.
    pub fn decide(safety: MarginSafety, risk_adjusted_score: Decimal) -> Self {
        if safety == MarginSafety::Danger || risk_adjusted_score < Decimal::ZERO {
            Recommendation::AvoidMargin
        } else if safety == MarginSafety::Safe && risk_adjusted_score > Decimal::ZERO {
            Recommendation::BuyOnMargin
        } else {
            Recommendation::Hold
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::BuyOnMargin => "Buy on Margin",
            Recommendation::AvoidMargin => "Avoid Margin",
            Recommendation::Hold => "Hold",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Recommendation {
    type Err = CoreError;

    /// Accepts the display label as well as compact spellings such as `buy-on-margin`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "buyonmargin" | "buy" => Ok(Recommendation::BuyOnMargin),
            "avoidmargin" | "avoid" => Ok(Recommendation::AvoidMargin),
            "hold" => Ok(Recommendation::Hold),
            _ => Err(CoreError::UnknownVariant {
                kind: "recommendation",
                value: s.to_string(),
            }),
        }
    }
}

fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
