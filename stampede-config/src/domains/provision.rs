//! Bootstrap provisioning configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many actors and how much stock to create before the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Number of actors (users) to create
    #[serde(default = "default_user_count")]
    pub user_count: usize,

    /// Quantity of the single coupon created for the run
    #[serde(default = "default_quantity")]
    pub quantity: u64,

    /// Number of actor-creation calls issued concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Actor display names are `{prefix}{n}` for n in 1..=user_count
    #[serde(default = "default_user_name_prefix")]
    pub user_name_prefix: String,

    /// Display name of the coupon creator
    #[serde(default = "default_creator_name")]
    pub creator_name: String,

    /// Display name of the coupon
    #[serde(default = "default_coupon_name")]
    pub coupon_name: String,

    /// Upper bound on the whole provisioning phase
    #[serde(with = "humantime_serde", default = "default_setup_timeout")]
    pub setup_timeout: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            user_count: default_user_count(),
            quantity: default_quantity(),
            batch_size: default_batch_size(),
            user_name_prefix: default_user_name_prefix(),
            creator_name: default_creator_name(),
            coupon_name: default_coupon_name(),
            setup_timeout: default_setup_timeout(),
        }
    }
}

impl Validatable for ProvisionConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.user_count, "user_count", self.domain_name())?;
        validate_positive(self.quantity, "quantity", self.domain_name())?;
        validate_positive(self.batch_size, "batch_size", self.domain_name())?;
        validate_positive(
            self.setup_timeout.as_millis(),
            "setup_timeout",
            self.domain_name(),
        )?;
        validate_required_string(&self.creator_name, "creator_name", self.domain_name())?;
        validate_required_string(&self.coupon_name, "coupon_name", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "provision"
    }
}

fn default_user_count() -> usize {
    50_000
}

fn default_quantity() -> u64 {
    3_000
}

fn default_batch_size() -> usize {
    5_000
}

fn default_user_name_prefix() -> String {
    "user_".to_string()
}

fn default_creator_name() -> String {
    "creator_1".to_string()
}

fn default_coupon_name() -> String {
    "load-test-coupon".to_string()
}

fn default_setup_timeout() -> Duration {
    Duration::from_secs(180)
}
