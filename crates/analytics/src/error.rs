use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid observation for '{symbol}': {reason}")]
    InvalidObservation { symbol: String, reason: String },

    #[error("Metrics engine parameters are invalid: {0}")]
    InvalidParameters(String),

    #[error("Calculation error for '{symbol}': {reason}")]
    Calculation { symbol: String, reason: String },
}

impl AnalyticsError {
    /// The symbol of the observation the error refers to, if any.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            AnalyticsError::InvalidObservation { symbol, .. }
            | AnalyticsError::Calculation { symbol, .. } => Some(symbol),
            AnalyticsError::InvalidParameters(_) => None,
        }
    }
}
