use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Invalid sizing or model parameters: {0}")]
    InvalidParameters(String),

    #[error("Cannot size a position at non-positive price {0}")]
    InvalidPrice(Decimal),

    #[error("Risk calculation failed: {0}")]
    Calculation(String),
}
