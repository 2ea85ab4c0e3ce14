//! Configuration error types

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Cannot read configuration file: {0}")]
    FileReadError(#[from] std::io::Error),

    /// The file is not valid YAML for `StampedeConfig`
    #[error("Invalid configuration document: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `STAMPEDE_*` override could not be applied
    #[error("Bad environment override: {0}")]
    EnvError(String),

    #[error("Unknown preset '{0}' (expected one of: coupon-rate, coupon-burst, gate-poll, gate-spike)")]
    UnknownPreset(String),

    /// A domain rejected its settings
    #[error("Invalid {domain} configuration: {message}")]
    DomainError { domain: String, message: String },
}
