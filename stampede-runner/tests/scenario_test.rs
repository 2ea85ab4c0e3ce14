mod common;

use common::{FakeCouponService, COUPON_URL};
use stampede_config::{
    OrderingMode, Preset, ProvisionConfig, StampedeConfig, ThresholdsConfig, WorkloadConfig,
};
use stampede_core::{
    ActorId, AllocationOutcome, ErrorVocabulary, OrderingViolation, OutcomeClassifier, RunMetrics,
};
use stampede_http::CouponApi;
use stampede_runner::{provision, ActorSelection, CouponIssue, RunError, Scenario};
use std::sync::Arc;
use std::time::Duration;

fn burst_config() -> StampedeConfig {
    let mut config = Preset::CouponBurst.config();
    config.target.base_url = COUPON_URL.to_string();
    config
}

fn rate_config(users: usize, quantity: u64, rate: f64) -> StampedeConfig {
    let mut config = Preset::CouponRate.config();
    config.target.base_url = COUPON_URL.to_string();
    config.provision.user_count = users;
    config.provision.quantity = quantity;
    config.provision.batch_size = 10;
    config.workload = WorkloadConfig::ConstantArrivalRate {
        rate,
        time_unit: Duration::from_secs(1),
        duration: Duration::from_secs(1),
        ramp_up: Vec::new(),
        ramp_down: Vec::new(),
        max_in_flight: 100,
    };
    config.thresholds =
        ThresholdsConfig::default().with("coupon_success_count", &format!("count=={}", quantity));
    config
}

fn small_provision(users: usize, quantity: u64) -> ProvisionConfig {
    ProvisionConfig {
        user_count: users,
        quantity,
        batch_size: 4,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_burst_allocates_exactly_quantity() {
    let service = Arc::new(FakeCouponService::new());
    let report = Scenario::new(burst_config(), service.clone())
        .run()
        .await
        .unwrap();

    let outcomes = report.summary.outcomes;
    assert_eq!(outcomes.success, 30);
    assert_eq!(outcomes.out_of_stock, 70);
    assert_eq!(outcomes.duplicate, 0);
    assert_eq!(outcomes.lock_timeout, 0);
    assert_eq!(outcomes.total(), 100);
    assert_eq!(service.issue_calls(), 100);

    let verdict = report.verification.as_ref().unwrap();
    assert_eq!(verdict.mode, OrderingMode::Dense);
    assert_eq!(verdict.sequence, (1..=30).collect::<Vec<u64>>());
    assert!(verdict.holds());

    assert_eq!(report.thresholds.len(), 4);
    assert!(report.passed, "{:?}", report.thresholds);
    assert_eq!(report.setup.as_ref().unwrap().actor_count, 100);
}

#[tokio::test(start_paused = true)]
async fn test_arrival_rate_counts_every_request_once() {
    let service = Arc::new(FakeCouponService::new());
    let report = Scenario::new(rate_config(50, 20, 100.0), service.clone())
        .run()
        .await
        .unwrap();

    let outcomes = report.summary.outcomes;
    assert_eq!(report.generator.started, 100);
    assert_eq!(report.generator.dropped, 0);
    assert_eq!(outcomes.total(), report.generator.completed);
    assert_eq!(outcomes.total(), service.issue_calls());

    // Random actors: every request past the quantity is a duplicate or out of stock
    assert_eq!(outcomes.success, 20);
    assert_eq!(outcomes.duplicate + outcomes.out_of_stock, 80);
    assert_eq!(outcomes.network_error + outcomes.unclassified, 0);

    let verdict = report.verification.as_ref().unwrap();
    assert_eq!(verdict.mode, OrderingMode::Monotonic);
    assert_eq!(verdict.sequence.len(), 20);
    assert!(report.passed);
}

#[tokio::test]
async fn test_second_attempt_is_duplicate() {
    let service = Arc::new(FakeCouponService::new());
    let api = CouponApi::new(service.clone(), COUPON_URL);
    let setup = provision(&api, &small_provision(3, 10)).await.unwrap();
    let metrics = Arc::new(RunMetrics::new());

    let issue = CouponIssue::new(
        api,
        setup.resource_id.clone(),
        Arc::new(setup.actors.clone()),
        ActorSelection::ByWorker,
        OutcomeClassifier::new(ErrorVocabulary::default()),
        metrics.clone(),
    );

    let actor = &setup.actors[0];
    assert_eq!(issue.issue(actor).await, AllocationOutcome::Success);
    assert_eq!(issue.issue(actor).await, AllocationOutcome::Duplicate);
    assert_eq!(issue.issue(actor).await, AllocationOutcome::Duplicate);
    assert_eq!(metrics.snapshot().outcomes.duplicate, 2);
}

#[tokio::test]
async fn test_no_success_beyond_quantity() {
    let service = Arc::new(FakeCouponService::new());
    let api = CouponApi::new(service.clone(), COUPON_URL);
    let setup = provision(&api, &small_provision(10, 3)).await.unwrap();
    let metrics = Arc::new(RunMetrics::new());

    let issue = CouponIssue::new(
        api,
        setup.resource_id.clone(),
        Arc::new(setup.actors.clone()),
        ActorSelection::ByWorker,
        OutcomeClassifier::default(),
        metrics.clone(),
    );

    let mut outcomes = Vec::new();
    for actor in &setup.actors {
        outcomes.push(issue.issue(actor).await);
    }
    assert!(outcomes[..3].iter().all(|o| *o == AllocationOutcome::Success));
    assert!(outcomes[3..].iter().all(|o| *o == AllocationOutcome::OutOfStock));
}

#[tokio::test]
async fn test_provisioning_creates_distinct_actors() {
    let service = Arc::new(FakeCouponService::new());
    let api = CouponApi::new(service, COUPON_URL);
    let setup = provision(&api, &small_provision(9, 5)).await.unwrap();

    assert_eq!(setup.actors.len(), 9);
    let mut ids: Vec<String> = setup.actors.iter().map(ActorId::to_string).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 9);
    assert_eq!(setup.quantity, 5);
}

#[tokio::test]
async fn test_setup_failure_aborts_run() {
    let service = Arc::new(FakeCouponService {
        reject_users: true,
        ..Default::default()
    });
    let err = Scenario::new(burst_config(), service.clone())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Setup { .. }), "{:?}", err);
    assert_eq!(service.issue_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_log_result_is_fatal() {
    let service = Arc::new(FakeCouponService {
        drop_log_result: true,
        ..Default::default()
    });
    let err = Scenario::new(burst_config(), service).run().await.unwrap_err();
    assert!(matches!(err, RunError::VerificationChannel(_)), "{:?}", err);
}

#[tokio::test(start_paused = true)]
async fn test_unordered_log_fails_run_without_error() {
    let service = Arc::new(FakeCouponService {
        reverse_log: true,
        ..Default::default()
    });
    let report = Scenario::new(burst_config(), service).run().await.unwrap();

    assert!(report.thresholds.iter().all(|t| t.passed));
    let verdict = report.verification.as_ref().unwrap();
    assert!(matches!(
        verdict.violation,
        Some(OrderingViolation::OutOfPlace { index: 0, .. })
    ));
    assert!(!report.passed);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_abandons_slow_requests() {
    let service = Arc::new(FakeCouponService {
        latency: Duration::from_millis(10),
        ..Default::default()
    });
    let mut config = burst_config();
    config.run.max_duration = Duration::from_millis(5);
    config.verification.enabled = false;

    let report = Scenario::new(config, service).run().await.unwrap();

    assert_eq!(report.generator.abandoned, 100);
    assert_eq!(report.generator.completed, 0);
    assert_eq!(report.summary.outcomes.total(), 0);
    assert!(report.verification.is_none());
    assert!(!report.passed);
}

#[tokio::test]
async fn test_coupon_run_without_mode_is_rejected() {
    let mut config = burst_config();
    config.verification.mode = None;
    let err = Scenario::new(config, Arc::new(FakeCouponService::new()))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Config(_)), "{:?}", err);
}
