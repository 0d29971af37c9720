use analytics::AnalyticsError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("Ingress is missing required columns: {}", .missing.join(", "))]
    SchemaError { missing: Vec<String> },

    #[error("The dataset contains no records")]
    EmptyDataset,

    #[error("Cannot rank {0} records: ranks stop at 4294967295")]
    TooManyRecords(usize),

    #[error("No record found for symbol '{0}'")]
    NotFound(String),

    #[error(transparent)]
    InvalidObservation(#[from] AnalyticsError),

    #[error("Analyzer configuration is invalid: {0}")]
    Configuration(String),
}
