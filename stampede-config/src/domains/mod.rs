//! Domain-specific configuration modules

pub mod gate;
pub mod http;
pub mod logging;
pub mod provision;
pub mod run;
pub mod target;
pub mod thresholds;
pub mod utils;
pub mod verification;
pub mod vocabulary;
pub mod workload;

use crate::error::{ConfigError, ConfigResult};
use crate::presets::Preset;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which service a run drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    /// Provision actors and a coupon, allocate, classify, verify ordering
    #[default]
    Coupon,
    /// Drive the waiting-room gate
    Gate,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioKind::Coupon => write!(f, "coupon"),
            ScenarioKind::Gate => write!(f, "gate"),
        }
    }
}

/// Main stampede configuration combining all domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampedeConfig {
    #[serde(default)]
    pub scenario: ScenarioKind,

    /// Allocation service endpoint
    #[serde(default)]
    pub target: target::TargetConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Bootstrap provisioning
    #[serde(default)]
    pub provision: provision::ProvisionConfig,

    /// Temporal profile
    #[serde(default)]
    pub workload: workload::WorkloadConfig,

    /// Waiting-room gate
    #[serde(default)]
    pub gate: gate::GateConfig,

    /// Post-run ordering verification
    #[serde(default)]
    pub verification: verification::VerificationConfig,

    /// Run-wide deadline
    #[serde(default)]
    pub run: run::RunConfig,

    /// Error vocabulary of the allocation service
    #[serde(default)]
    pub vocabulary: vocabulary::VocabularyConfig,

    /// Pass/fail thresholds
    #[serde(default, skip_serializing_if = "thresholds::ThresholdsConfig::is_empty")]
    pub thresholds: thresholds::ThresholdsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl Default for StampedeConfig {
    fn default() -> Self {
        Preset::CouponRate.config()
    }
}

impl StampedeConfig {
    /// Validate all domain configurations and their combination
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.http.validate()?;
        self.provision.validate()?;
        self.workload.validate()?;
        self.gate.validate()?;
        self.verification.validate()?;
        self.run.validate()?;
        self.vocabulary.validate()?;
        self.thresholds.validate()?;
        self.logging.validate()?;

        match self.scenario {
            ScenarioKind::Coupon => {
                if self.verification.enabled && self.verification.mode.is_none() {
                    return Err(ConfigError::DomainError {
                        domain: "verification".to_string(),
                        message: "mode must be set to 'monotonic' or 'dense' when verification is enabled".to_string(),
                    });
                }
            }
            ScenarioKind::Gate => {
                if matches!(
                    self.workload,
                    workload::WorkloadConfig::PerActorIterations { .. }
                ) {
                    return Err(ConfigError::DomainError {
                        domain: "workload".to_string(),
                        message: "per-actor-iterations needs provisioned actors; gate runs use constant-arrival-rate or ramping-workers".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = StampedeConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
