//! Named run profiles
//!
//! Each preset is a complete, valid configuration for one of the standard
//! runs: a sustained arrival-rate run against the coupon API, an
//! all-at-once burst of distinct actors, and the two waiting-room shapes.

use crate::domains::gate::GateMode;
use crate::domains::thresholds::ThresholdsConfig;
use crate::domains::verification::OrderingMode;
use crate::domains::workload::{StageConfig, WorkloadConfig};
use crate::domains::{ScenarioKind, StampedeConfig};
use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// 50 000 actors, quantity 3 000, 1 000 req/s for 120 s, monotonic log
    CouponRate,
    /// 100 actors, quantity 30, one request each, dense log
    CouponBurst,
    /// Ramp to 2 000 workers that enqueue and poll until admitted
    GatePoll,
    /// Ramp to 2 000 workers hammering the enqueue endpoint
    GateSpike,
}

impl Preset {
    pub fn all() -> &'static [Preset] {
        &[
            Preset::CouponRate,
            Preset::CouponBurst,
            Preset::GatePoll,
            Preset::GateSpike,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::CouponRate => "coupon-rate",
            Preset::CouponBurst => "coupon-burst",
            Preset::GatePoll => "gate-poll",
            Preset::GateSpike => "gate-spike",
        }
    }

    /// Build the full configuration for this preset
    pub fn config(&self) -> StampedeConfig {
        let mut config = StampedeConfig {
            scenario: ScenarioKind::Coupon,
            target: Default::default(),
            http: Default::default(),
            provision: Default::default(),
            workload: Default::default(),
            gate: Default::default(),
            verification: Default::default(),
            run: Default::default(),
            vocabulary: Default::default(),
            thresholds: Default::default(),
            logging: Default::default(),
        };

        match self {
            Preset::CouponRate => {
                config.verification.mode = Some(OrderingMode::Monotonic);
                config.thresholds = ThresholdsConfig::default().with(
                    "coupon_success_count",
                    &format!("count=={}", config.provision.quantity),
                );
            }
            Preset::CouponBurst => {
                config.provision.user_count = 100;
                config.provision.quantity = 30;
                config.provision.batch_size = 100;
                config.workload = WorkloadConfig::PerActorIterations {
                    max_duration: Duration::from_secs(60),
                };
                config.verification.mode = Some(OrderingMode::Dense);
                config.run.max_duration = Duration::from_secs(60);
                config.thresholds = ThresholdsConfig::default()
                    .with("coupon_success_count", "count==30")
                    .with("coupon_out_of_stock_count", "count==70")
                    .with("coupon_duplicate_count", "count==0")
                    .with("coupon_lock_timeout_count", "count==0");
            }
            Preset::GatePoll => {
                config.scenario = ScenarioKind::Gate;
                config.gate.mode = GateMode::Poll;
                config.workload = WorkloadConfig::RampingWorkers {
                    start_workers: 0,
                    stages: vec![
                        StageConfig::new(Duration::from_secs(10), 100),
                        StageConfig::new(Duration::from_secs(20), 1000),
                        StageConfig::new(Duration::from_secs(60), 2000),
                        StageConfig::new(Duration::from_secs(10), 0),
                    ],
                    control_interval: Duration::from_millis(100),
                };
                config.verification.enabled = false;
                config.thresholds = ThresholdsConfig::default()
                    .with("waiting_time", "p(95)<60000")
                    .with("checks", "rate>0.99");
            }
            Preset::GateSpike => {
                config.scenario = ScenarioKind::Gate;
                config.gate.mode = GateMode::Spike;
                config.workload = WorkloadConfig::RampingWorkers {
                    start_workers: 0,
                    stages: vec![
                        StageConfig::new(Duration::from_secs(10), 50),
                        StageConfig::new(Duration::from_secs(10), 1000),
                        StageConfig::new(Duration::from_secs(60), 2000),
                        StageConfig::new(Duration::from_secs(30), 0),
                    ],
                    control_interval: Duration::from_millis(100),
                };
                config.verification.enabled = false;
                config.thresholds = ThresholdsConfig::default()
                    .with("http_req_failed", "rate<0.01")
                    .with("http_req_duration", "p(95)<2000");
            }
        }

        config
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::all()
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}
