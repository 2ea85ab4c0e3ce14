//! Run metrics: outcome counters plus the rates and trends used by thresholds

use crate::counters::{OutcomeCounters, OutcomeTally};
use crate::outcome::OutcomeKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Samples of a timing metric, in milliseconds
#[derive(Debug, Default)]
pub struct Trend {
    samples: Mutex<Vec<f64>>,
}

impl Trend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, value: f64) {
        self.samples.lock().push(value);
    }

    pub fn add_duration(&self, duration: Duration) {
        self.add(duration.as_secs_f64() * 1000.0);
    }

    pub fn snapshot(&self) -> TrendSnapshot {
        let mut values = self.samples.lock().clone();
        values.sort_by(|a, b| a.total_cmp(b));
        TrendSnapshot::from_sorted(values)
    }
}

/// Summary of a trend at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSnapshot {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub med: f64,
    pub p90: f64,
    pub p95: f64,
    #[serde(skip)]
    sorted: Vec<f64>,
}

impl TrendSnapshot {
    fn from_sorted(sorted: Vec<f64>) -> Self {
        if sorted.is_empty() {
            return Self::default();
        }
        let sum: f64 = sorted.iter().sum();
        let mut snapshot = Self {
            count: sorted.len() as u64,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            avg: sum / sorted.len() as f64,
            med: 0.0,
            p90: 0.0,
            p95: 0.0,
            sorted,
        };
        snapshot.med = snapshot.percentile(50.0);
        snapshot.p90 = snapshot.percentile(90.0);
        snapshot.p95 = snapshot.percentile(95.0);
        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Nearest-rank percentile; 0 for an empty trend
    pub fn percentile(&self, p: f64) -> f64 {
        if self.sorted.is_empty() {
            return 0.0;
        }
        let rank = (p.clamp(0.0, 100.0) / 100.0 * self.sorted.len() as f64).ceil() as usize;
        self.sorted[rank.clamp(1, self.sorted.len()) - 1]
    }
}

/// Pass/fail ratio
#[derive(Debug, Default)]
pub struct RateMetric {
    passes: AtomicU64,
    total: AtomicU64,
}

impl RateMetric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, passed: bool) {
        if passed {
            self.passes.fetch_add(1, Ordering::Relaxed);
        }
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RateSummary {
        RateSummary::new(
            self.passes.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RateSummary {
    pub passes: u64,
    pub fails: u64,
    pub rate: f64,
}

impl RateSummary {
    pub fn new(passes: u64, total: u64) -> Self {
        let fails = total.saturating_sub(passes);
        let rate = if total == 0 {
            0.0
        } else {
            passes as f64 / total as f64
        };
        Self { passes, fails, rate }
    }

    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }
}

/// Every metric a run records, shared across workers
#[derive(Debug, Default)]
pub struct RunMetrics {
    pub outcomes: OutcomeCounters,
    dropped_iterations: AtomicU64,
    checks: RateMetric,
    named_checks: Mutex<BTreeMap<&'static str, (u64, u64)>>,
    pub http_req_failed: RateMetric,
    pub http_req_duration: Trend,
    pub waiting_time: Trend,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a named boolean check; feeds the aggregate `checks` rate
    pub fn check(&self, name: &'static str, passed: bool) -> bool {
        self.checks.add(passed);
        let mut named = self.named_checks.lock();
        let entry = named.entry(name).or_insert((0, 0));
        if passed {
            entry.0 += 1;
        }
        entry.1 += 1;
        passed
    }

    pub fn drop_iteration(&self) {
        self.dropped_iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_iterations(&self) -> u64 {
        self.dropped_iterations.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let check_breakdown = self
            .named_checks
            .lock()
            .iter()
            .map(|(name, (passes, total))| (name.to_string(), RateSummary::new(*passes, *total)))
            .collect();

        MetricsSnapshot {
            outcomes: self.outcomes.snapshot(),
            dropped_iterations: self.dropped_iterations(),
            checks: self.checks.snapshot(),
            check_breakdown,
            http_req_failed: self.http_req_failed.snapshot(),
            http_req_duration: self.http_req_duration.snapshot(),
            waiting_time: self.waiting_time.snapshot(),
        }
    }
}

/// A metric value as seen by threshold evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue<'a> {
    Counter(u64),
    Rate(&'a RateSummary),
    Trend(&'a TrendSnapshot),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub outcomes: OutcomeTally,
    pub dropped_iterations: u64,
    pub checks: RateSummary,
    pub check_breakdown: BTreeMap<String, RateSummary>,
    pub http_req_failed: RateSummary,
    pub http_req_duration: TrendSnapshot,
    pub waiting_time: TrendSnapshot,
}

impl MetricsSnapshot {
    /// Look a metric up by name. Rates and trends without samples were
    /// never recorded and yield `None`.
    pub fn value(&self, name: &str) -> Option<MetricValue<'_>> {
        if let Some(kind) = OutcomeKind::from_metric_name(name) {
            return Some(MetricValue::Counter(self.outcomes.get(kind)));
        }
        match name {
            "dropped_iterations" => Some(MetricValue::Counter(self.dropped_iterations)),
            "checks" => Some(&self.checks)
                .filter(|r| r.total() > 0)
                .map(MetricValue::Rate),
            "http_req_failed" => Some(&self.http_req_failed)
                .filter(|r| r.total() > 0)
                .map(MetricValue::Rate),
            "http_req_duration" => Some(&self.http_req_duration)
                .filter(|t| !t.is_empty())
                .map(MetricValue::Trend),
            "waiting_time" => Some(&self.waiting_time)
                .filter(|t| !t.is_empty())
                .map(MetricValue::Trend),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::AllocationOutcome;

    #[test]
    fn test_trend_percentiles() {
        let trend = Trend::new();
        for v in 1..=100 {
            trend.add(v as f64);
        }
        let snapshot = trend.snapshot();
        assert_eq!(snapshot.count, 100);
        assert_eq!(snapshot.min, 1.0);
        assert_eq!(snapshot.max, 100.0);
        assert_eq!(snapshot.avg, 50.5);
        assert_eq!(snapshot.med, 50.0);
        assert_eq!(snapshot.p95, 95.0);
        assert_eq!(snapshot.percentile(99.0), 99.0);
        assert_eq!(snapshot.percentile(0.0), 1.0);
    }

    #[test]
    fn test_trend_durations_are_milliseconds() {
        let trend = Trend::new();
        trend.add_duration(Duration::from_secs(6));
        assert_eq!(trend.snapshot().max, 6000.0);
    }

    #[test]
    fn test_rate_summary() {
        let rate = RateMetric::new();
        rate.add(true);
        rate.add(true);
        rate.add(true);
        rate.add(false);
        let summary = rate.snapshot();
        assert_eq!(summary.passes, 3);
        assert_eq!(summary.fails, 1);
        assert_eq!(summary.rate, 0.75);
    }

    #[test]
    fn test_named_checks_feed_aggregate() {
        let metrics = RunMetrics::new();
        assert!(metrics.check("status is 200", true));
        assert!(!metrics.check("entered processing", false));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.checks.total(), 2);
        assert_eq!(snapshot.check_breakdown["status is 200"].passes, 1);
        assert_eq!(snapshot.check_breakdown["entered processing"].fails, 1);
    }

    #[test]
    fn test_snapshot_lookup() {
        let metrics = RunMetrics::new();
        metrics.outcomes.record(&AllocationOutcome::Success);
        metrics.drop_iteration();
        let snapshot = metrics.snapshot();

        assert_eq!(
            snapshot.value("coupon_success_count"),
            Some(MetricValue::Counter(1))
        );
        assert_eq!(
            snapshot.value("coupon_duplicate_count"),
            Some(MetricValue::Counter(0))
        );
        assert_eq!(
            snapshot.value("dropped_iterations"),
            Some(MetricValue::Counter(1))
        );
        assert_eq!(snapshot.value("waiting_time"), None);
        assert_eq!(snapshot.value("checks"), None);
        assert_eq!(snapshot.value("no_such_metric"), None);
    }
}
