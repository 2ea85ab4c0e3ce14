//! Workload (temporal profile) configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One linear ramp segment: move from the previous target to `target`
/// over `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub target: u64,
}

impl StageConfig {
    pub fn new(duration: Duration, target: u64) -> Self {
        Self { duration, target }
    }
}

/// Scheduling discipline for the allocation requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "executor", rename_all = "kebab-case")]
pub enum WorkloadConfig {
    /// Start `rate` requests per `time_unit` regardless of response latency
    ConstantArrivalRate {
        rate: f64,
        #[serde(with = "humantime_serde", default = "default_time_unit")]
        time_unit: Duration,
        #[serde(with = "humantime_serde")]
        duration: Duration,
        /// Rate ramps (targets are arrivals per `time_unit`) before the steady phase
        #[serde(default)]
        ramp_up: Vec<StageConfig>,
        /// Rate ramps after the steady phase
        #[serde(default)]
        ramp_down: Vec<StageConfig>,
        /// Upper bound of concurrently in-flight requests
        #[serde(default = "default_max_in_flight")]
        max_in_flight: usize,
    },

    /// Linearly ramp the number of looping workers through `stages`
    RampingWorkers {
        #[serde(default)]
        start_workers: u64,
        stages: Vec<StageConfig>,
        #[serde(with = "humantime_serde", default = "default_control_interval")]
        control_interval: Duration,
    },

    /// Exactly one request per provisioned actor, all released together
    PerActorIterations {
        #[serde(with = "humantime_serde", default = "default_max_duration")]
        max_duration: Duration,
    },
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig::ConstantArrivalRate {
            rate: 1_000.0,
            time_unit: default_time_unit(),
            duration: Duration::from_secs(120),
            ramp_up: Vec::new(),
            ramp_down: Vec::new(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

impl WorkloadConfig {
    /// Executor name as written in configuration files
    pub fn executor_name(&self) -> &'static str {
        match self {
            WorkloadConfig::ConstantArrivalRate { .. } => "constant-arrival-rate",
            WorkloadConfig::RampingWorkers { .. } => "ramping-workers",
            WorkloadConfig::PerActorIterations { .. } => "per-actor-iterations",
        }
    }
}

impl Validatable for WorkloadConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self {
            WorkloadConfig::ConstantArrivalRate {
                rate,
                time_unit,
                duration,
                ramp_up,
                ramp_down,
                max_in_flight,
            } => {
                if !rate.is_finite() {
                    return Err(self.validation_error("rate must be a finite number"));
                }
                validate_positive(*rate, "rate", self.domain_name())?;
                validate_positive(time_unit.as_nanos(), "time_unit", self.domain_name())?;
                validate_positive(duration.as_nanos(), "duration", self.domain_name())?;
                validate_positive(*max_in_flight, "max_in_flight", self.domain_name())?;
                for stage in ramp_up.iter().chain(ramp_down) {
                    validate_positive(
                        stage.duration.as_nanos(),
                        "stage duration",
                        self.domain_name(),
                    )?;
                }
            }
            WorkloadConfig::RampingWorkers {
                stages,
                control_interval,
                ..
            } => {
                if stages.is_empty() {
                    return Err(self.validation_error("ramping-workers needs at least one stage"));
                }
                validate_positive(
                    control_interval.as_nanos(),
                    "control_interval",
                    self.domain_name(),
                )?;
                if stages.iter().all(|s| s.duration.is_zero()) {
                    return Err(self.validation_error("stages have zero total duration"));
                }
            }
            WorkloadConfig::PerActorIterations { max_duration } => {
                validate_positive(max_duration.as_nanos(), "max_duration", self.domain_name())?;
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "workload"
    }
}

fn default_time_unit() -> Duration {
    Duration::from_secs(1)
}

fn default_max_in_flight() -> usize {
    20_000
}

fn default_control_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_max_duration() -> Duration {
    Duration::from_secs(60)
}
