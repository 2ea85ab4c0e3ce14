//! Threshold expressions evaluated against a metrics snapshot

use crate::metrics::{MetricValue, MetricsSnapshot};
use serde::Serialize;
use stampede_config::ThresholdsConfig;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThresholdParseError {
    #[error("Threshold '{0}' has no comparison operator")]
    MissingOperator(String),

    #[error("Unknown aggregation '{aggregation}' in threshold '{expression}'")]
    UnknownAggregation {
        expression: String,
        aggregation: String,
    },

    #[error("Invalid number '{value}' in threshold '{expression}'")]
    InvalidNumber { expression: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    Count,
    Rate,
    Avg,
    Min,
    Max,
    Med,
    Percentile(f64),
}

impl Aggregation {
    fn extract(&self, value: MetricValue<'_>) -> Option<f64> {
        match (self, value) {
            (Aggregation::Count, MetricValue::Counter(n)) => Some(n as f64),
            (Aggregation::Count, MetricValue::Rate(r)) => Some(r.passes as f64),
            (Aggregation::Count, MetricValue::Trend(t)) => Some(t.count as f64),
            (Aggregation::Rate, MetricValue::Rate(r)) => Some(r.rate),
            (Aggregation::Avg, MetricValue::Trend(t)) => Some(t.avg),
            (Aggregation::Min, MetricValue::Trend(t)) => Some(t.min),
            (Aggregation::Max, MetricValue::Trend(t)) => Some(t.max),
            (Aggregation::Med, MetricValue::Trend(t)) => Some(t.med),
            (Aggregation::Percentile(p), MetricValue::Trend(t)) => Some(t.percentile(*p)),
            _ => None,
        }
    }
}

impl FromStr for Aggregation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(Aggregation::Count),
            "rate" => Ok(Aggregation::Rate),
            "avg" => Ok(Aggregation::Avg),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "med" => Ok(Aggregation::Med),
            _ => s
                .strip_prefix("p(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|p| p.trim().parse::<f64>().ok())
                .filter(|p| (0.0..=100.0).contains(p))
                .map(Aggregation::Percentile)
                .ok_or(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    // Two-character operators first so `<=` is not read as `<`
    const TOKENS: [(&'static str, Comparison); 6] = [
        ("==", Comparison::Eq),
        ("!=", Comparison::Ne),
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
    ];

    fn apply(&self, observed: f64, bound: f64) -> bool {
        match self {
            Comparison::Eq => observed == bound,
            Comparison::Ne => observed != bound,
            Comparison::Lt => observed < bound,
            Comparison::Le => observed <= bound,
            Comparison::Gt => observed > bound,
            Comparison::Ge => observed >= bound,
        }
    }
}

/// One parsed expression such as `p(95)<60000`
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub expression: String,
    pub aggregation: Aggregation,
    pub comparison: Comparison,
    pub bound: f64,
}

impl Threshold {
    pub fn parse(expression: &str) -> Result<Self, ThresholdParseError> {
        let compact: String = expression.chars().filter(|c| !c.is_whitespace()).collect();

        let split = compact
            .find(['=', '!', '<', '>'])
            .ok_or_else(|| ThresholdParseError::MissingOperator(expression.to_string()))?;
        let (left, rest) = compact.split_at(split);

        let (token, comparison) = Comparison::TOKENS
            .iter()
            .find(|(token, _)| rest.starts_with(token))
            .copied()
            .ok_or_else(|| ThresholdParseError::MissingOperator(expression.to_string()))?;

        let aggregation = left
            .parse::<Aggregation>()
            .map_err(|_| ThresholdParseError::UnknownAggregation {
                expression: expression.to_string(),
                aggregation: left.to_string(),
            })?;

        let value = &rest[token.len()..];
        let bound = value
            .parse::<f64>()
            .map_err(|_| ThresholdParseError::InvalidNumber {
                expression: expression.to_string(),
                value: value.to_string(),
            })?;

        Ok(Self {
            expression: expression.trim().to_string(),
            aggregation,
            comparison,
            bound,
        })
    }

    /// Observed value and verdict; a metric that was never recorded, or one
    /// that does not support this aggregation, fails.
    pub fn evaluate(&self, value: Option<MetricValue<'_>>) -> (Option<f64>, bool) {
        match value.and_then(|v| self.aggregation.extract(v)) {
            Some(observed) => (Some(observed), self.comparison.apply(observed, self.bound)),
            None => (None, false),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdResult {
    pub metric: String,
    pub expression: String,
    pub observed: Option<f64>,
    pub passed: bool,
}

/// All thresholds of a run, keyed by metric name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdSet {
    entries: Vec<(String, Threshold)>,
}

impl ThresholdSet {
    pub fn from_config(config: &ThresholdsConfig) -> Result<Self, ThresholdParseError> {
        let mut entries = Vec::new();
        for (metric, expressions) in &config.metrics {
            for expression in expressions {
                entries.push((metric.clone(), Threshold::parse(expression)?));
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> Vec<ThresholdResult> {
        self.entries
            .iter()
            .map(|(metric, threshold)| {
                let (observed, passed) = threshold.evaluate(snapshot.value(metric));
                ThresholdResult {
                    metric: metric.clone(),
                    expression: threshold.expression.clone(),
                    observed,
                    passed,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RunMetrics;
    use crate::outcome::AllocationOutcome;
    use std::time::Duration;

    #[test]
    fn test_parse_expressions() {
        let t = Threshold::parse("count==30").unwrap();
        assert_eq!(t.aggregation, Aggregation::Count);
        assert_eq!(t.comparison, Comparison::Eq);
        assert_eq!(t.bound, 30.0);

        let t = Threshold::parse("p(95) < 60000").unwrap();
        assert_eq!(t.aggregation, Aggregation::Percentile(95.0));
        assert_eq!(t.comparison, Comparison::Lt);

        let t = Threshold::parse("rate>=0.99").unwrap();
        assert_eq!(t.comparison, Comparison::Ge);
        assert_eq!(t.bound, 0.99);

        assert_eq!(Threshold::parse("max!=0").unwrap().comparison, Comparison::Ne);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Threshold::parse("count"),
            Err(ThresholdParseError::MissingOperator(_))
        ));
        assert!(matches!(
            Threshold::parse("total==3"),
            Err(ThresholdParseError::UnknownAggregation { .. })
        ));
        assert!(matches!(
            Threshold::parse("p(150)<3"),
            Err(ThresholdParseError::UnknownAggregation { .. })
        ));
        assert!(matches!(
            Threshold::parse("count==many"),
            Err(ThresholdParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_evaluate_against_run_metrics() {
        let metrics = RunMetrics::new();
        for _ in 0..30 {
            metrics.outcomes.record(&AllocationOutcome::Success);
        }
        for _ in 0..70 {
            metrics.outcomes.record(&AllocationOutcome::OutOfStock);
        }
        metrics.waiting_time.add_duration(Duration::from_secs(6));

        let config = ThresholdsConfig::default()
            .with("coupon_success_count", "count==30")
            .with("coupon_out_of_stock_count", "count==70")
            .with("coupon_duplicate_count", "count==0")
            .with("waiting_time", "p(95)<60000");
        let set = ThresholdSet::from_config(&config).unwrap();
        assert_eq!(set.len(), 4);

        let results = set.evaluate(&metrics.snapshot());
        assert!(results.iter().all(|r| r.passed), "{:?}", results);
    }

    #[test]
    fn test_unrecorded_or_mismatched_metric_fails() {
        let config = ThresholdsConfig::default()
            .with("checks", "rate>0.99")
            .with("coupon_success_count", "p(95)<10");
        let set = ThresholdSet::from_config(&config).unwrap();

        let results = set.evaluate(&RunMetrics::new().snapshot());
        assert_eq!(results.len(), 2);
        for result in results {
            assert!(!result.passed);
            assert_eq!(result.observed, None);
        }
    }

    #[test]
    fn test_failing_bound() {
        let metrics = RunMetrics::new();
        metrics.outcomes.record(&AllocationOutcome::Duplicate);
        let set =
            ThresholdSet::from_config(&ThresholdsConfig::default().with("coupon_duplicate_count", "count==0"))
                .unwrap();
        let results = set.evaluate(&metrics.snapshot());
        assert_eq!(results[0].observed, Some(1.0));
        assert!(!results[0].passed);
    }
}
