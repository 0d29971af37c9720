use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read marginscope settings: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid marginscope settings: {0}")]
    ValidationError(String),

    #[error("Failed to initialise logging: {0}")]
    LoggingError(String),
}
