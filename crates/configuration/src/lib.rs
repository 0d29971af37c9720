use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_logging;
pub use settings::{
    BadRecordPolicy, Config, DatasetSettings, LoggingSettings, MarginModelKind,
    MarginModelSettings, PositionSizing, ScoringWeights,
};

/// Prefix of environment variables that override file settings,
/// e.g. `MARGINSCOPE__SCORING__RISK_WEIGHT=0.2`.
pub const ENV_PREFIX: &str = "MARGINSCOPE";

/// Loads the application configuration from an optional `marginscope.toml` in the
/// working directory, layered under environment overrides.
///
/// A missing file is not an error: every section has defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    build(config::File::with_name("marginscope").required(false))
}

/// Loads the configuration from an explicit file, which must exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    build(config::File::from(path).required(true))
}

fn build<S>(file: S) -> Result<Config, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
