use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0} is invalid: {1}")]
    InvalidInput(String, String),

    #[error("Unrecognised {kind} value: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}
