//! Bootstrap provisioning: actors, one creator, one coupon

use crate::error::{RunError, RunResult};
use futures::future::join_all;
use serde::Serialize;
use stampede_config::ProvisionConfig;
use stampede_core::{ActorId, CreatorId, ResourceId};
use stampede_http::CouponApi;
use tokio::time::Instant;
use tracing::{debug, info};

/// Everything the workload needs from setup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provisioned {
    #[serde(skip)]
    pub actors: Vec<ActorId>,
    pub actor_count: usize,
    pub creator_id: CreatorId,
    pub resource_id: ResourceId,
    pub quantity: u64,
}

/// Create `user_count` actors in concurrent batches of `batch_size`, then
/// the creator, then the coupon. The first failed call aborts setup.
pub async fn provision(api: &CouponApi, config: &ProvisionConfig) -> RunResult<Provisioned> {
    let started = Instant::now();
    info!(
        users = config.user_count,
        batch_size = config.batch_size,
        quantity = config.quantity,
        "Provisioning"
    );

    let mut actors = Vec::with_capacity(config.user_count);
    let numbers: Vec<usize> = (1..=config.user_count).collect();

    for batch in numbers.chunks(config.batch_size.max(1)) {
        let names: Vec<String> = batch
            .iter()
            .map(|n| format!("{}{}", config.user_name_prefix, n))
            .collect();
        let results = join_all(names.iter().map(|name| api.create_user(name))).await;

        for (name, result) in names.iter().zip(results) {
            let actor = result.map_err(|e| RunError::setup(format!("create user {}", name), e))?;
            actors.push(actor);
        }
        debug!(created = actors.len(), "User batch complete");
    }

    let creator_id = api
        .create_creator(&config.creator_name)
        .await
        .map_err(|e| RunError::setup("create creator", e))?;

    let resource_id = api
        .create_coupon(&creator_id, config.quantity, &config.coupon_name)
        .await
        .map_err(|e| RunError::setup("create coupon", e))?;

    info!(
        users = actors.len(),
        creator_id = %creator_id,
        coupon_id = %resource_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Provisioning complete"
    );

    Ok(Provisioned {
        actor_count: actors.len(),
        actors,
        creator_id,
        resource_id,
        quantity: config.quantity,
    })
}
