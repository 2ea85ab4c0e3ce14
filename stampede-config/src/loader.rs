//! Configuration loading and environment variable handling

use crate::domains::StampedeConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::presets::Preset;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: StampedeConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load a named preset with environment overrides
    pub fn from_preset(&self, preset: Preset) -> ConfigResult<StampedeConfig> {
        let mut config = preset.config();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load the default configuration with environment overrides
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        self.from_preset(Preset::CouponRate)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        self.apply_target_overrides(config)?;
        self.apply_provision_overrides(config)?;
        self.apply_workload_overrides(config)?;
        self.apply_gate_overrides(config)?;
        self.apply_run_overrides(config)?;
        self.apply_logging_overrides(config)?;
        Ok(())
    }

    fn apply_target_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("BASE_URL") {
            config.target.base_url = base_url;
        }

        if let Some(seconds) = self.parse_env::<u64>("HTTP_TIMEOUT")? {
            config.http.timeout = Duration::from_secs(seconds);
        }

        Ok(())
    }

    fn apply_provision_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        if let Some(user_count) = self.parse_env("USER_COUNT")? {
            config.provision.user_count = user_count;
        }

        if let Some(quantity) = self.parse_env("QUANTITY")? {
            config.provision.quantity = quantity;
        }

        if let Some(batch_size) = self.parse_env("BATCH_SIZE")? {
            config.provision.batch_size = batch_size;
        }

        Ok(())
    }

    fn apply_workload_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        use crate::domains::workload::WorkloadConfig;

        if let Some(new_rate) = self.parse_env::<f64>("RATE")? {
            match &mut config.workload {
                WorkloadConfig::ConstantArrivalRate { rate, .. } => *rate = new_rate,
                other => {
                    return Err(ConfigError::EnvError(format!(
                        "{}_RATE only applies to constant-arrival-rate, workload is {}",
                        self.prefix,
                        other.executor_name()
                    )))
                }
            }
        }

        Ok(())
    }

    fn apply_gate_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("GATE_BASE_URL") {
            config.gate.base_url = base_url;
        }

        if let Some(millis) = self.parse_env::<u64>("POLL_INTERVAL_MS")? {
            config.gate.poll_interval = Duration::from_millis(millis);
        }

        if let Some(attempts) = self.parse_env("MAX_POLL_ATTEMPTS")? {
            config.gate.max_poll_attempts = attempts;
        }

        Ok(())
    }

    fn apply_run_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        if let Some(seconds) = self.parse_env::<u64>("MAX_RUN_SECONDS")? {
            config.run.max_duration = Duration::from_secs(seconds);
        }

        if let Ok(mode) = self.get_env_var("VERIFY_MODE") {
            config.verification.mode = Some(mode.parse().map_err(ConfigError::EnvError)?);
        }

        Ok(())
    }

    fn apply_logging_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.logging.level = log_level
                .parse()
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.logging.format = format
                .parse()
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Parse a prefixed environment variable if it is set
    fn parse_env<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => {
                debug!("Applying override {}_{}={}", self.prefix, name, raw);
                raw.trim()
                    .parse()
                    .map(Some)
                    .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e)))
            }
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
