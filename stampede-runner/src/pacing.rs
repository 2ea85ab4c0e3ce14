//! Clock-driven pacing profiles
//!
//! A [`LinearProfile`] is a piecewise-linear curve over run time. The
//! ramping-workers executor samples it for its worker target; the
//! arrival-rate executor reads it as arrivals per second and integrates it
//! exactly to place every arrival on the timeline.

use stampede_config::{StageConfig, WorkloadConfig};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    start: f64,
    duration: f64,
    from: f64,
    to: f64,
    /// Area under the curve before this segment
    area_before: f64,
}

impl Segment {
    fn end(&self) -> f64 {
        self.start + self.duration
    }

    fn area(&self) -> f64 {
        (self.from + self.to) / 2.0 * self.duration
    }

    fn value_at(&self, offset: f64) -> f64 {
        if self.duration <= 0.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * (offset / self.duration)
    }

    /// Area from the segment start to `offset`
    fn area_until(&self, offset: f64) -> f64 {
        let slope = if self.duration > 0.0 {
            (self.to - self.from) / self.duration
        } else {
            0.0
        };
        self.from * offset + slope * offset * offset / 2.0
    }

    /// Offset into the segment at which the area reaches `area`.
    ///
    /// Solves `from*t + (to-from)/(2d)*t^2 = area` in the form
    /// `t = 2r / (b + sqrt(b^2 + 4ar))`, which stays stable for flat and
    /// falling segments.
    fn offset_for_area(&self, area: f64) -> Option<f64> {
        if area <= 0.0 {
            return Some(0.0);
        }
        let a = (self.to - self.from) / (2.0 * self.duration);
        let b = self.from;
        let discriminant = (b * b + 4.0 * a * area).max(0.0);
        let denominator = b + discriminant.sqrt();
        if denominator <= 0.0 {
            return None;
        }
        Some((2.0 * area / denominator).min(self.duration))
    }
}

/// Piecewise-linear curve starting at time zero
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearProfile {
    segments: Vec<Segment>,
}

impl LinearProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// k6-style stages: each ramps linearly from the previous target
    pub fn from_stages(start: f64, stages: &[StageConfig]) -> Self {
        let mut profile = Self::new();
        let mut current = start;
        for stage in stages {
            profile.push(stage.duration, current, stage.target as f64);
            current = stage.target as f64;
        }
        profile
    }

    /// Linear ramp from the current end value to `target`
    pub fn ramp(mut self, duration: Duration, target: f64) -> Self {
        let from = self.end_value();
        self.push(duration, from, target);
        self
    }

    /// Flat segment at `value`
    pub fn hold(mut self, duration: Duration, value: f64) -> Self {
        self.push(duration, value, value);
        self
    }

    fn push(&mut self, duration: Duration, from: f64, to: f64) {
        let (start, area_before) = self
            .segments
            .last()
            .map(|s| (s.end(), s.area_before + s.area()))
            .unwrap_or((0.0, 0.0));
        self.segments.push(Segment {
            start,
            duration: duration.as_secs_f64(),
            from: from.max(0.0),
            to: to.max(0.0),
            area_before,
        });
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_secs_f64(self.total_secs())
    }

    fn total_secs(&self) -> f64 {
        self.segments.last().map(Segment::end).unwrap_or(0.0)
    }

    fn end_value(&self) -> f64 {
        self.segments.last().map(|s| s.to).unwrap_or(0.0)
    }

    /// Largest value anywhere on the curve
    pub fn peak(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.from.max(s.to))
            .fold(0.0, f64::max)
    }

    /// Curve value at `at`; zero outside the profile
    pub fn value_at(&self, at: Duration) -> f64 {
        let t = at.as_secs_f64();
        self.segments
            .iter()
            .find(|s| t >= s.start && t < s.end())
            .map(|s| s.value_at(t - s.start))
            .unwrap_or(0.0)
    }

    /// Integral of the curve over `[0, at]`
    pub fn area_until(&self, at: Duration) -> f64 {
        let t = at.as_secs_f64().min(self.total_secs());
        match self.segments.iter().find(|s| t < s.end()) {
            Some(s) => s.area_before + s.area_until(t - s.start),
            None => self.total_area(),
        }
    }

    pub fn total_area(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.area_before + s.area())
            .unwrap_or(0.0)
    }
}

/// Arrival timeline of a constant-arrival-rate profile.
///
/// Arrival `n` (from zero) starts at the instant the integrated rate reaches
/// `n`, so a flat 1000/s phase places arrivals exactly 1ms apart and a ramp
/// spaces them by the instantaneous rate.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalSchedule {
    rate: LinearProfile,
}

impl ArrivalSchedule {
    /// `rate` must be in arrivals per second
    pub fn new(rate: LinearProfile) -> Self {
        Self { rate }
    }

    /// Steady `rate` per second for `duration`
    pub fn constant(rate: f64, duration: Duration) -> Self {
        Self::new(LinearProfile::new().hold(duration, rate))
    }

    /// Build from a constant-arrival-rate workload: ramp-up stages from zero,
    /// the steady phase, then ramp-down stages. Rates are normalised from
    /// `time_unit` to seconds.
    pub fn from_workload(workload: &WorkloadConfig) -> Option<Self> {
        let WorkloadConfig::ConstantArrivalRate {
            rate,
            time_unit,
            duration,
            ramp_up,
            ramp_down,
            ..
        } = workload
        else {
            return None;
        };

        let unit = time_unit.as_secs_f64();
        let mut profile = LinearProfile::new();
        for stage in ramp_up {
            profile = profile.ramp(stage.duration, stage.target as f64 / unit);
        }
        profile = profile.hold(*duration, rate / unit);
        for stage in ramp_down {
            profile = profile.ramp(stage.duration, stage.target as f64 / unit);
        }
        Some(Self::new(profile))
    }

    pub fn total_duration(&self) -> Duration {
        self.rate.total_duration()
    }

    /// Arrivals per second at `at`
    pub fn rate_at(&self, at: Duration) -> f64 {
        self.rate.value_at(at)
    }

    /// Number of arrivals the schedule will emit
    pub fn expected_arrivals(&self) -> u64 {
        self.offsets().count() as u64
    }

    /// Offset of arrival `n`, or `None` if it falls outside the profile
    pub fn offset_of(&self, n: u64) -> Option<Duration> {
        self.offsets().nth(n as usize)
    }

    /// Offsets of every arrival in order
    pub fn offsets(&self) -> ArrivalOffsets<'_> {
        ArrivalOffsets {
            schedule: self,
            next: 0,
            segment: 0,
        }
    }
}

/// Iterator over arrival offsets; walks the segments once
#[derive(Debug, Clone)]
pub struct ArrivalOffsets<'a> {
    schedule: &'a ArrivalSchedule,
    next: u64,
    segment: usize,
}

impl Iterator for ArrivalOffsets<'_> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let segments = &self.schedule.rate.segments;
        let target = self.next as f64;

        loop {
            let segment = segments.get(self.segment)?;
            let area_end = segment.area_before + segment.area();
            if target < area_end {
                let offset = segment.offset_for_area(target - segment.area_before)?;
                let at = segment.start + offset;
                if at >= segment.end() {
                    self.segment += 1;
                    continue;
                }
                self.next += 1;
                return Some(Duration::from_secs_f64(at));
            }
            self.segment += 1;
        }
    }
}
