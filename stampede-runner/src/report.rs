//! Run report

use crate::generator::GeneratorStats;
use crate::provision::Provisioned;
use chrono::{DateTime, Utc};
use serde::Serialize;
use stampede_config::ScenarioKind;
use stampede_core::{MetricsSnapshot, OrderingVerdict, ThresholdResult};
use uuid::Uuid;

/// Everything a run observed, and whether it passed
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub scenario: ScenarioKind,
    pub executor: &'static str,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup: Option<Provisioned>,
    pub generator: GeneratorStats,
    pub summary: MetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<OrderingVerdict>,
    pub thresholds: Vec<ThresholdResult>,
    pub passed: bool,
}

impl RunReport {
    /// A run passes iff every threshold passes and the ordering verdict,
    /// when there is one, holds
    pub fn verdict(thresholds: &[ThresholdResult], verification: Option<&OrderingVerdict>) -> bool {
        thresholds.iter().all(|t| t.passed) && verification.is_none_or(OrderingVerdict::holds)
    }

    pub fn failed_thresholds(&self) -> impl Iterator<Item = &ThresholdResult> {
        self.thresholds.iter().filter(|t| !t.passed)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
