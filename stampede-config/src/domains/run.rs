//! Run-wide bounds

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Overall deadline for the workload phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Hard deadline for the workload; in-flight work is abandoned on expiry
    #[serde(with = "humantime_serde", default = "default_max_duration")]
    pub max_duration: Duration,

    /// How long arrival-rate runs wait for in-flight requests after the last tick
    #[serde(with = "humantime_serde", default = "default_graceful_stop")]
    pub graceful_stop: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_duration: default_max_duration(),
            graceful_stop: default_graceful_stop(),
        }
    }
}

impl Validatable for RunConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.max_duration.as_millis(),
            "max_duration",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "run"
    }
}

fn default_max_duration() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_graceful_stop() -> Duration {
    Duration::from_secs(30)
}
