//! Workload executors
//!
//! Three scheduling disciplines drive the same [`Workload`] seam:
//! constant arrival rate (start times fixed by the clock, independent of
//! latency), ramping workers (a looping worker pool sized by a stage curve),
//! and per-actor iterations (one iteration per actor, released together).

use crate::deadline::RunDeadline;
use crate::pacing::{ArrivalSchedule, LinearProfile};
use async_trait::async_trait;
use serde::Serialize;
use stampede_core::RunMetrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Barrier, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Coordinates of one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iteration {
    /// Sequence number across the whole run
    pub index: u64,
    /// Worker slot; for per-actor runs this is the actor's position
    pub worker: usize,
}

/// One unit of traffic: an allocation call, a gate admission, a spike hit
#[async_trait]
pub trait Workload: Send + Sync + 'static {
    async fn iterate(&self, iteration: Iteration);
}

/// What an executor did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GeneratorStats {
    /// Ticks that came due before the deadline
    pub scheduled: u64,
    /// Iterations actually started
    pub started: u64,
    /// Iterations that ran to completion
    pub completed: u64,
    /// Ticks dropped because the in-flight pool was full
    pub dropped: u64,
    /// Iterations still in flight when the run ended
    pub abandoned: u64,
}

/// Start iterations on the arrival clock.
///
/// Each due tick takes a permit from a pool of `max_in_flight`; when the
/// pool is empty the tick is dropped and counted rather than delayed, so
/// the arrival rate never silently sags. After the last tick in-flight
/// iterations get up to `graceful_stop` (bounded by the deadline).
pub async fn run_constant_arrival<W: Workload + ?Sized>(
    workload: Arc<W>,
    schedule: &ArrivalSchedule,
    max_in_flight: usize,
    graceful_stop: Duration,
    deadline: &RunDeadline,
    metrics: &RunMetrics,
) -> GeneratorStats {
    info!(
        executor = "constant-arrival-rate",
        duration_s = schedule.total_duration().as_secs_f64(),
        max_in_flight,
        "Starting workload"
    );

    let pool = Arc::new(Semaphore::new(max_in_flight));
    let completed = Arc::new(AtomicU64::new(0));
    let mut tasks = JoinSet::new();
    let mut stats = GeneratorStats::default();

    let origin = Instant::now();
    let expired = deadline.expired();
    tokio::pin!(expired);

    for (index, offset) in schedule.offsets().enumerate() {
        let due = origin + offset;
        if due >= deadline.expires_at() {
            break;
        }
        tokio::select! {
            _ = sleep_until(due) => {}
            _ = &mut expired => break,
        }

        stats.scheduled += 1;
        while tasks.try_join_next().is_some() {}

        match pool.clone().try_acquire_owned() {
            Ok(permit) => {
                stats.started += 1;
                let workload = workload.clone();
                let completed = completed.clone();
                let iteration = Iteration {
                    index: index as u64,
                    worker: index,
                };
                tasks.spawn(async move {
                    workload.iterate(iteration).await;
                    completed.fetch_add(1, Ordering::Relaxed);
                    drop(permit);
                });
            }
            Err(_) => {
                stats.dropped += 1;
                metrics.drop_iteration();
                if stats.dropped == 1 {
                    warn!(max_in_flight, "In-flight pool exhausted, dropping arrivals");
                } else {
                    debug!(dropped = stats.dropped, "Dropped arrival");
                }
            }
        }
    }

    drain(&mut tasks, deadline.clamp(graceful_stop), deadline).await;
    finish(&mut tasks, &mut stats, &completed);

    if stats.dropped > 0 {
        warn!(dropped = stats.dropped, "Arrivals dropped by a saturated pool");
    }
    info!(
        started = stats.started,
        completed = stats.completed,
        abandoned = stats.abandoned,
        "Workload finished"
    );
    stats
}

/// Loop workers while the stage curve says they are wanted.
///
/// A controller samples `profile` every `control_interval` and publishes the
/// rounded target on a watch channel; worker `i` iterates while `i < target`
/// and parks otherwise. When the profile ends the target drops to zero and
/// workers leave after their current iteration.
pub async fn run_ramping_workers<W: Workload + ?Sized>(
    workload: Arc<W>,
    profile: &LinearProfile,
    control_interval: Duration,
    graceful_stop: Duration,
    deadline: &RunDeadline,
) -> GeneratorStats {
    let max_workers = profile.peak().ceil() as usize;
    info!(
        executor = "ramping-workers",
        max_workers,
        duration_s = profile.total_duration().as_secs_f64(),
        "Starting workload"
    );

    let (target_tx, target_rx) = watch::channel(0usize);
    let started = Arc::new(AtomicU64::new(0));
    let completed = Arc::new(AtomicU64::new(0));
    let mut tasks = JoinSet::new();

    for worker in 0..max_workers {
        let mut target = target_rx.clone();
        let workload = workload.clone();
        let started = started.clone();
        let completed = completed.clone();
        tasks.spawn(async move {
            loop {
                let wanted = target.wait_for(|target| *target > worker).await.is_ok();
                if !wanted {
                    break;
                }
                let index = started.fetch_add(1, Ordering::Relaxed);
                workload.iterate(Iteration { index, worker }).await;
                completed.fetch_add(1, Ordering::Relaxed);
            }
        });
    }
    drop(target_rx);

    let origin = Instant::now();
    let total = profile.total_duration();
    let mut ticker = tokio::time::interval(control_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let expired = deadline.expired();
    tokio::pin!(expired);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut expired => break,
        }
        let elapsed = origin.elapsed();
        if elapsed >= total {
            break;
        }
        let wanted = profile.value_at(elapsed).round() as usize;
        target_tx.send_if_modified(|current| {
            if *current == wanted {
                return false;
            }
            debug!(workers = wanted, "Worker target changed");
            *current = wanted;
            true
        });
    }
    target_tx.send_replace(0);
    drop(target_tx);

    drain(&mut tasks, deadline.clamp(graceful_stop), deadline).await;

    let mut stats = GeneratorStats {
        scheduled: started.load(Ordering::Relaxed),
        started: started.load(Ordering::Relaxed),
        ..Default::default()
    };
    finish(&mut tasks, &mut stats, &completed);
    info!(
        started = stats.started,
        completed = stats.completed,
        abandoned = stats.abandoned,
        "Workload finished"
    );
    stats
}

/// One iteration per actor slot, all released by a barrier.
///
/// Bounded by `max_duration` and the run deadline, whichever is sooner.
pub async fn run_per_actor<W: Workload + ?Sized>(
    workload: Arc<W>,
    actors: usize,
    max_duration: Duration,
    deadline: &RunDeadline,
) -> GeneratorStats {
    info!(executor = "per-actor-iterations", actors, "Starting workload");

    let barrier = Arc::new(Barrier::new(actors));
    let completed = Arc::new(AtomicU64::new(0));
    let mut tasks = JoinSet::new();

    for worker in 0..actors {
        let barrier = barrier.clone();
        let workload = workload.clone();
        let completed = completed.clone();
        tasks.spawn(async move {
            barrier.wait().await;
            workload
                .iterate(Iteration {
                    index: worker as u64,
                    worker,
                })
                .await;
            completed.fetch_add(1, Ordering::Relaxed);
        });
    }

    drain(&mut tasks, deadline.clamp(max_duration), deadline).await;

    let mut stats = GeneratorStats {
        scheduled: actors as u64,
        started: actors as u64,
        ..Default::default()
    };
    finish(&mut tasks, &mut stats, &completed);
    info!(
        completed = stats.completed,
        abandoned = stats.abandoned,
        "Workload finished"
    );
    stats
}

/// Await in-flight iterations until `until` or the deadline
async fn drain(tasks: &mut JoinSet<()>, until: Instant, deadline: &RunDeadline) {
    let joined = async {
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    error!("Iteration panicked: {}", e);
                }
            }
        }
    };
    tokio::select! {
        _ = timeout_at(until, joined) => {}
        _ = deadline.expired() => {}
    }
}

/// Abandon whatever is still running and settle the counts
fn finish(tasks: &mut JoinSet<()>, stats: &mut GeneratorStats, completed: &AtomicU64) {
    stats.abandoned = tasks.len() as u64;
    if stats.abandoned > 0 {
        warn!(abandoned = stats.abandoned, "Abandoning in-flight iterations");
    }
    tasks.abort_all();
    stats.completed = completed.load(Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::StopSignal;
    use stampede_config::StageConfig;
    use std::sync::atomic::AtomicUsize;

    /// Sleeps for a fixed time and tracks concurrency
    #[derive(Default)]
    struct Sleeper {
        latency: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        workers: parking_lot::Mutex<Vec<usize>>,
    }

    impl Sleeper {
        fn new(latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                latency,
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl Workload for Sleeper {
        async fn iterate(&self, iteration: Iteration) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.workers.lock().push(iteration.worker);
            tokio::time::sleep(self.latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn deadline(secs: u64) -> RunDeadline {
        RunDeadline::start(Duration::from_secs(secs), StopSignal::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_arrival_rate_starts_every_tick() {
        let workload = Sleeper::new(Duration::from_millis(50));
        let schedule = ArrivalSchedule::constant(100.0, Duration::from_secs(2));
        let metrics = RunMetrics::new();

        let stats = run_constant_arrival(
            workload.clone(),
            &schedule,
            64,
            Duration::from_secs(30),
            &deadline(60),
            &metrics,
        )
        .await;

        assert_eq!(stats.scheduled, 200);
        assert_eq!(stats.started, 200);
        assert_eq!(stats.completed, 200);
        assert_eq!(stats.dropped, 0);
        // 100/s with 50ms latency keeps about five in flight
        assert!(workload.peak.load(Ordering::SeqCst) <= 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saturated_pool_drops_ticks() {
        let workload = Sleeper::new(Duration::from_secs(1));
        let schedule = ArrivalSchedule::constant(100.0, Duration::from_secs(1));
        let metrics = RunMetrics::new();

        let stats = run_constant_arrival(
            workload.clone(),
            &schedule,
            5,
            Duration::from_secs(30),
            &deadline(60),
            &metrics,
        )
        .await;

        assert_eq!(stats.scheduled, 100);
        assert_eq!(stats.started + stats.dropped, stats.scheduled);
        assert!(stats.dropped > 0);
        assert_eq!(metrics.dropped_iterations(), stats.dropped);
        assert!(workload.peak.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_abandons_in_flight() {
        let workload = Sleeper::new(Duration::from_secs(600));
        let run = deadline(2);

        let stats = run_per_actor(workload.clone(), 10, Duration::from_secs(60), &run).await;

        assert_eq!(stats.started, 10);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.abandoned, 10);
        assert!(run.elapsed() <= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_actor_runs_each_slot_once() {
        let workload = Sleeper::new(Duration::from_millis(10));
        let stats = run_per_actor(workload.clone(), 25, Duration::from_secs(60), &deadline(60)).await;

        assert_eq!(stats.completed, 25);
        let mut workers = workload.workers.lock().clone();
        workers.sort_unstable();
        assert_eq!(workers, (0..25).collect::<Vec<_>>());
        assert_eq!(workload.peak.load(Ordering::SeqCst), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramping_workers_follow_stages() {
        let workload = Sleeper::new(Duration::from_millis(100));
        let profile = LinearProfile::from_stages(
            0.0,
            &[
                StageConfig::new(Duration::from_secs(1), 4),
                StageConfig::new(Duration::from_secs(2), 4),
                StageConfig::new(Duration::from_secs(1), 0),
            ],
        );

        let stats = run_ramping_workers(
            workload.clone(),
            &profile,
            Duration::from_millis(100),
            Duration::from_secs(30),
            &deadline(60),
        )
        .await;

        assert!(stats.completed > 0);
        assert_eq!(stats.completed, stats.started);
        assert_eq!(stats.abandoned, 0);
        assert!(workload.peak.load(Ordering::SeqCst) <= 4);
        assert!(workload.workers.lock().iter().all(|w| *w < 4));
    }
}
