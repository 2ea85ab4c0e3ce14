//! HTTP client configuration

use crate::errors::HttpError;
use reqwest::Client;
use stampede_config::HttpConfig as ConfigHttpConfig;
use std::time::Duration;
use tracing::debug;

/// Settings for the shared connection pool
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout
    pub timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    /// Idle connections kept per host
    pub max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        ConfigHttpConfig::default().into()
    }
}

impl From<ConfigHttpConfig> for HttpConfig {
    fn from(config: ConfigHttpConfig) -> Self {
        Self {
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
            user_agent: config.user_agent,
            verify_ssl: config.verify_ssl,
            max_idle_per_host: config.max_idle_per_host,
        }
    }
}

impl HttpConfig {
    /// Build the reqwest client every worker shares
    pub fn build_client(&self) -> Result<Client, HttpError> {
        debug!(
            timeout_ms = self.timeout.as_millis() as u64,
            max_idle_per_host = self.max_idle_per_host,
            "Building HTTP client"
        );
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| HttpError::ConfigError(e.to_string()))?;
        Ok(client)
    }
}
