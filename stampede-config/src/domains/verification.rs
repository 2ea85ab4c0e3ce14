//! Post-run verification configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Ordering predicate applied to the completion log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingMode {
    /// Every adjacent pair strictly increases
    Monotonic,
    /// The log is exactly 1..=quantity
    Dense,
}

impl fmt::Display for OrderingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingMode::Monotonic => write!(f, "monotonic"),
            OrderingMode::Dense => write!(f, "dense"),
        }
    }
}

impl FromStr for OrderingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monotonic" => Ok(OrderingMode::Monotonic),
            "dense" => Ok(OrderingMode::Dense),
            _ => Err(format!("Invalid verification mode: {}", s)),
        }
    }
}

/// Verification settings. `mode` has no default: a coupon run with
/// verification enabled must name its strictness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    #[serde(default = "crate::domains::utils::default_true")]
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<OrderingMode>,

    /// Upper bound on fetching the completion log
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: None,
            timeout: default_timeout(),
        }
    }
}

impl Validatable for VerificationConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.timeout.as_millis(), "timeout", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "verification"
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}
