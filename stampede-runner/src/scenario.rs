//! Scenario orchestration: setup, generation, verification, verdict

use crate::deadline::{RunDeadline, StopSignal};
use crate::error::{RunError, RunResult};
use crate::gate::{GatePollWorkload, GatePoller, GateSpikeWorkload};
use crate::generator::{
    run_constant_arrival, run_per_actor, run_ramping_workers, GeneratorStats, Workload,
};
use crate::issue::{ActorSelection, CouponIssue};
use crate::pacing::{ArrivalSchedule, LinearProfile};
use crate::provision::{provision, Provisioned};
use crate::report::RunReport;
use crate::verify::Verifier;
use chrono::Utc;
use stampede_config::{GateMode, ScenarioKind, StampedeConfig, WorkloadConfig};
use stampede_core::{ErrorVocabulary, OrderingVerdict, OutcomeClassifier, RunMetrics, ThresholdSet};
use stampede_http::{CouponApi, GateApi, TargetClient};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// One configured run against the target services
pub struct Scenario {
    config: StampedeConfig,
    client: Arc<dyn TargetClient>,
    stop: StopSignal,
}

impl Scenario {
    pub fn new(config: StampedeConfig, client: Arc<dyn TargetClient>) -> Self {
        Self {
            config,
            client,
            stop: StopSignal::new(),
        }
    }

    /// Handle that ends the generation phase early (e.g. on Ctrl-C)
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn config(&self) -> &StampedeConfig {
        &self.config
    }

    /// Run to completion.
    ///
    /// Setup failures and a broken verification channel are errors; every
    /// outcome of the system under test ends up in the report instead.
    pub async fn run(&self) -> RunResult<RunReport> {
        self.config.validate_all()?;
        let thresholds = ThresholdSet::from_config(&self.config.thresholds)?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let metrics = Arc::new(RunMetrics::new());
        info!(
            run_id = %run_id,
            scenario = %self.config.scenario,
            executor = self.config.workload.executor_name(),
            "Run started"
        );

        let (setup, generator, verification) = match self.config.scenario {
            ScenarioKind::Coupon => self.run_coupon(&metrics).await?,
            ScenarioKind::Gate => (None, self.run_gate(&metrics).await?, None),
        };

        let summary = metrics.snapshot();
        let results = thresholds.evaluate(&summary);
        for result in results.iter().filter(|r| !r.passed) {
            warn!(
                metric = %result.metric,
                expression = %result.expression,
                observed = ?result.observed,
                "Threshold failed"
            );
        }
        let passed = RunReport::verdict(&results, verification.as_ref());

        let report = RunReport {
            run_id,
            scenario: self.config.scenario,
            executor: self.config.workload.executor_name(),
            started_at,
            finished_at: Utc::now(),
            setup,
            generator,
            summary,
            verification,
            thresholds: results,
            passed,
        };
        info!(
            run_id = %run_id,
            passed,
            requests = report.summary.outcomes.total(),
            "Run finished"
        );
        Ok(report)
    }

    async fn run_coupon(
        &self,
        metrics: &Arc<RunMetrics>,
    ) -> RunResult<(Option<Provisioned>, GeneratorStats, Option<OrderingVerdict>)> {
        let verification = &self.config.verification;
        // validate_all guarantees a mode whenever verification is enabled
        let mode = verification.mode.filter(|_| verification.enabled);

        let api = CouponApi::new(self.client.clone(), self.config.target.base_url.clone());
        let setup_timeout = self.config.provision.setup_timeout;
        let setup = tokio::time::timeout(setup_timeout, provision(&api, &self.config.provision))
            .await
            .map_err(|_| RunError::SetupTimeout(setup_timeout))??;

        let selection = match self.config.workload {
            WorkloadConfig::PerActorIterations { .. } => ActorSelection::ByWorker,
            _ => ActorSelection::Random,
        };
        let workload = Arc::new(CouponIssue::new(
            api.clone(),
            setup.resource_id.clone(),
            Arc::new(setup.actors.clone()),
            selection,
            OutcomeClassifier::new(ErrorVocabulary::from(&self.config.vocabulary)),
            metrics.clone(),
        ));
        let generator = self.drive(workload, setup.actors.len(), metrics).await?;

        let verdict = match mode {
            Some(mode) => Some(
                Verifier::new(api, mode, setup.quantity, verification.timeout)
                    .verify(&setup.resource_id)
                    .await?,
            ),
            None => None,
        };

        Ok((Some(setup), generator, verdict))
    }

    async fn run_gate(&self, metrics: &Arc<RunMetrics>) -> RunResult<GeneratorStats> {
        let gate = &self.config.gate;
        let api = GateApi::new(self.client.clone(), gate.base_url.clone(), gate.event_id);
        info!(event_id = gate.event_id, mode = %gate.mode, "Driving gate");

        match gate.mode {
            GateMode::Poll => {
                let poller = GatePoller::new(api, gate, metrics.clone());
                let workload = Arc::new(GatePollWorkload::new(poller, gate.user_id_max));
                self.drive(workload, 0, metrics).await
            }
            GateMode::Spike => {
                let workload = Arc::new(GateSpikeWorkload::new(api, gate, metrics.clone()));
                self.drive(workload, 0, metrics).await
            }
        }
    }

    /// Hand the workload to the executor named by the workload config
    async fn drive<W: Workload>(
        &self,
        workload: Arc<W>,
        actors: usize,
        metrics: &RunMetrics,
    ) -> RunResult<GeneratorStats> {
        let run = &self.config.run;
        let deadline = RunDeadline::start(run.max_duration, self.stop.clone());

        match &self.config.workload {
            profile @ WorkloadConfig::ConstantArrivalRate { max_in_flight, .. } => {
                let schedule =
                    ArrivalSchedule::from_workload(profile).ok_or(RunError::UnsupportedProfile {
                        scenario: self.config.scenario,
                        executor: profile.executor_name(),
                    })?;
                Ok(run_constant_arrival(
                    workload,
                    &schedule,
                    *max_in_flight,
                    run.graceful_stop,
                    &deadline,
                    metrics,
                )
                .await)
            }
            WorkloadConfig::RampingWorkers {
                start_workers,
                stages,
                control_interval,
            } => {
                let profile = LinearProfile::from_stages(*start_workers as f64, stages);
                Ok(run_ramping_workers(
                    workload,
                    &profile,
                    *control_interval,
                    run.graceful_stop,
                    &deadline,
                )
                .await)
            }
            profile @ WorkloadConfig::PerActorIterations { max_duration } => {
                if self.config.scenario != ScenarioKind::Coupon {
                    return Err(RunError::UnsupportedProfile {
                        scenario: self.config.scenario,
                        executor: profile.executor_name(),
                    });
                }
                Ok(run_per_actor(workload, actors, *max_duration, &deadline).await)
            }
        }
    }
}
