//! Waiting-room gate configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which gate workload each worker iteration performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// Enqueue once, then poll the rank endpoint until admitted
    #[default]
    Poll,
    /// Enqueue only, as fast as the pause allows
    Spike,
}

impl fmt::Display for GateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateMode::Poll => write!(f, "poll"),
            GateMode::Spike => write!(f, "spike"),
        }
    }
}

impl FromStr for GateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "poll" => Ok(GateMode::Poll),
            "spike" => Ok(GateMode::Spike),
            _ => Err(format!("Invalid gate mode: {}", s)),
        }
    }
}

/// Gate endpoint and polling budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Base URL of the gate service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Event whose queue is exercised
    #[serde(default = "default_event_id")]
    pub event_id: u64,

    #[serde(default)]
    pub mode: GateMode,

    /// Minimum spacing between two polls of the same actor
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Polls allowed per actor before it is abandoned
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Actor ids are drawn uniformly from 1..=user_id_max
    #[serde(default = "default_user_id_max")]
    pub user_id_max: u64,

    /// Pause after each spike-mode enqueue
    #[serde(with = "humantime_serde", default = "default_spike_pause")]
    pub spike_pause: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            event_id: default_event_id(),
            mode: GateMode::default(),
            poll_interval: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            user_id_max: default_user_id_max(),
            spike_pause: default_spike_pause(),
        }
    }
}

impl Validatable for GateConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        validate_positive(
            self.poll_interval.as_millis(),
            "poll_interval",
            self.domain_name(),
        )?;
        validate_positive(
            self.max_poll_attempts,
            "max_poll_attempts",
            self.domain_name(),
        )?;
        validate_positive(self.user_id_max, "user_id_max", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "gate"
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_event_id() -> u64 {
    1001
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_max_poll_attempts() -> u32 {
    40
}

fn default_user_id_max() -> u64 {
    1_000_000
}

fn default_spike_pause() -> Duration {
    Duration::from_millis(50)
}
