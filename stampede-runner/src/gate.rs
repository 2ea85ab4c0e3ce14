//! Waiting-room gate drivers
//!
//! The poller walks one actor through `enqueue -> WAITING* -> PROCESSING`,
//! sleeping a fixed interval before every poll and giving up after a fixed
//! number of attempts. The spike driver only enqueues.

use crate::generator::{Iteration, Workload};
use crate::observe::observe;
use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use stampede_config::GateConfig;
use stampede_core::{GateStatus, RunMetrics, WaitTicket};
use stampede_http::{EnqueueAck, GateApi};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

pub const CHECK_ENQUEUE_OK: &str = "enqueue status 200";
pub const CHECK_ENTERED: &str = "entered processing";
pub const CHECK_STATUS_OK: &str = "status is 200";
pub const CHECK_BODY_ENQUEUED: &str = "body has ENQUEUED";

/// Terminal state of one actor's pass through the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Admission {
    /// Observed `PROCESSING` after `polls` polls
    Admitted { waited: Duration, polls: u32 },
    /// Attempt budget exhausted without admission
    Abandoned {
        polls: u32,
        last_rank: Option<u64>,
    },
    /// Enqueue was not answered with 200
    EnqueueFailed { status: Option<u16> },
}

/// Per-actor state machine over the gate's enqueue and rank endpoints
#[derive(Clone)]
pub struct GatePoller {
    api: GateApi,
    poll_interval: Duration,
    max_attempts: u32,
    metrics: Arc<RunMetrics>,
}

impl GatePoller {
    pub fn new(api: GateApi, config: &GateConfig, metrics: Arc<RunMetrics>) -> Self {
        Self {
            api,
            poll_interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
            metrics,
        }
    }

    /// Enqueue `user_id` and poll until admitted or out of attempts.
    ///
    /// The wait sample runs from just before the enqueue call to the poll
    /// that first reports `PROCESSING`; no poll is issued after that.
    pub async fn admit(&self, user_id: u64) -> Admission {
        let enqueued_at = Instant::now();
        let enqueue = observe(&self.metrics, self.api.enqueue(user_id)).await;

        let enqueue_status = enqueue.as_ref().ok().map(|r| r.status);
        if !self.metrics.check(CHECK_ENQUEUE_OK, enqueue_status == Some(200)) {
            debug!(user_id, status = ?enqueue_status, "Enqueue failed");
            return Admission::EnqueueFailed {
                status: enqueue_status,
            };
        }

        let mut ticket = WaitTicket::new(user_id, enqueued_at);
        ticket.last_known_rank = enqueue
            .as_ref()
            .ok()
            .and_then(EnqueueAck::from_response)
            .and_then(|ack| ack.rank);
        let mut polls = 0;

        while polls < self.max_attempts {
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            let status = match observe(&self.metrics, self.api.rank(user_id)).await {
                Ok(response) => GateApi::parse_status(&response),
                Err(e) => {
                    trace!(user_id, error = %e, "Poll got no response");
                    None
                }
            };

            match status {
                Some(status) => {
                    if ticket.observe(&status) {
                        let waited = ticket.waited(Instant::now());
                        self.metrics.waiting_time.add_duration(waited);
                        self.metrics.check(CHECK_ENTERED, true);
                        debug!(user_id, polls, waited_ms = waited.as_millis() as u64, "Admitted");
                        return Admission::Admitted { waited, polls };
                    }
                    if let GateStatus::Unknown(raw) = &status {
                        trace!(user_id, status = %raw, "Gate does not know this ticket");
                    }
                }
                None => trace!(user_id, polls, "Unreadable poll response"),
            }
        }

        self.metrics.check(CHECK_ENTERED, false);
        debug!(user_id, polls, rank = ?ticket.last_known_rank, "Poll budget exhausted");
        Admission::Abandoned {
            polls,
            last_rank: ticket.last_known_rank,
        }
    }
}

fn random_user(user_id_max: u64) -> u64 {
    rand::rng().random_range(1..=user_id_max.max(1))
}

/// Full admission flow for a random user per iteration
pub struct GatePollWorkload {
    poller: GatePoller,
    user_id_max: u64,
}

impl GatePollWorkload {
    pub fn new(poller: GatePoller, user_id_max: u64) -> Self {
        Self {
            poller,
            user_id_max,
        }
    }
}

#[async_trait]
impl Workload for GatePollWorkload {
    async fn iterate(&self, _iteration: Iteration) {
        let user_id = random_user(self.user_id_max);
        self.poller.admit(user_id).await;
    }
}

/// Enqueue-only burst traffic for a random user per iteration
pub struct GateSpikeWorkload {
    api: GateApi,
    user_id_max: u64,
    pause: Duration,
    metrics: Arc<RunMetrics>,
}

impl GateSpikeWorkload {
    pub fn new(api: GateApi, config: &GateConfig, metrics: Arc<RunMetrics>) -> Self {
        Self {
            api,
            user_id_max: config.user_id_max,
            pause: config.spike_pause,
            metrics,
        }
    }
}

#[async_trait]
impl Workload for GateSpikeWorkload {
    async fn iterate(&self, _iteration: Iteration) {
        let user_id = random_user(self.user_id_max);
        let exchange = observe(&self.metrics, self.api.enqueue(user_id)).await;

        let (status_ok, enqueued) = match &exchange {
            Ok(response) => (response.is_ok(), GateApi::is_enqueued(response)),
            Err(_) => (false, false),
        };
        self.metrics.check(CHECK_STATUS_OK, status_ok);
        self.metrics.check(CHECK_BODY_ENQUEUED, enqueued);

        tokio::time::sleep(self.pause).await;
    }
}
