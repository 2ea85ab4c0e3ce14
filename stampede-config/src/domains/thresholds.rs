//! Pass/fail thresholds per metric
//!
//! Expressions follow the k6 shape (`count==30`, `rate>0.99`,
//! `p(95)<60000`); they are parsed and evaluated by `stampede-core`.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdsConfig {
    pub metrics: BTreeMap<String, Vec<String>>,
}

impl ThresholdsConfig {
    /// Add an expression for `metric`
    pub fn with(mut self, metric: &str, expression: &str) -> Self {
        self.metrics
            .entry(metric.to_string())
            .or_default()
            .push(expression.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.values().all(Vec::is_empty)
    }
}

impl Validatable for ThresholdsConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (metric, expressions) in &self.metrics {
            validate_required_string(metric, "metric name", self.domain_name())?;
            for expression in expressions {
                validate_required_string(expression, metric, self.domain_name())?;
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "thresholds"
    }
}
