//! Coupon allocation workload

use crate::generator::{Iteration, Workload};
use crate::observe::observe;
use async_trait::async_trait;
use rand::Rng;
use stampede_core::{
    ActorId, AllocationOutcome, AllocationRequest, OutcomeClassifier, ResourceId, RunMetrics,
};
use stampede_http::CouponApi;
use std::sync::Arc;
use tracing::{debug, trace};

/// How an iteration picks its actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorSelection {
    /// Uniformly at random from the provisioned set (rate profiles)
    Random,
    /// The actor at the iteration's worker slot (one distinct actor each)
    ByWorker,
}

/// Issues one coupon per iteration and classifies the result
pub struct CouponIssue {
    api: CouponApi,
    resource_id: ResourceId,
    actors: Arc<Vec<ActorId>>,
    selection: ActorSelection,
    classifier: OutcomeClassifier,
    metrics: Arc<RunMetrics>,
}

impl CouponIssue {
    pub fn new(
        api: CouponApi,
        resource_id: ResourceId,
        actors: Arc<Vec<ActorId>>,
        selection: ActorSelection,
        classifier: OutcomeClassifier,
        metrics: Arc<RunMetrics>,
    ) -> Self {
        Self {
            api,
            resource_id,
            actors,
            selection,
            classifier,
            metrics,
        }
    }

    fn pick(&self, iteration: Iteration) -> Option<&ActorId> {
        match self.selection {
            ActorSelection::Random => {
                if self.actors.is_empty() {
                    return None;
                }
                let slot = rand::rng().random_range(0..self.actors.len());
                self.actors.get(slot)
            }
            ActorSelection::ByWorker => self.actors.get(iteration.worker),
        }
    }

    /// Issue for `actor`, count the outcome and return it
    pub async fn issue(&self, actor: &ActorId) -> AllocationOutcome {
        let request = AllocationRequest {
            actor_id: actor.clone(),
            resource_id: self.resource_id.clone(),
        };
        let exchange = observe(&self.metrics, self.api.issue_coupon(&request)).await;
        let outcome = self.classifier.classify(&exchange);
        self.metrics.outcomes.record(&outcome);

        match (&outcome, &exchange) {
            (AllocationOutcome::NetworkError, Err(e)) => {
                debug!(actor_id = %actor, error = %e, "Allocation got no response")
            }
            _ => trace!(actor_id = %actor, kind = %outcome.kind(), "Allocation classified"),
        }
        outcome
    }
}

#[async_trait]
impl Workload for CouponIssue {
    async fn iterate(&self, iteration: Iteration) {
        if let Some(actor) = self.pick(iteration) {
            self.issue(actor).await;
        } else {
            debug!(worker = iteration.worker, "No actor for worker slot");
        }
    }
}
