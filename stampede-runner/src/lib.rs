//! Run orchestration for stampede
//!
//! Setup, paced workload generation, waiting-room polling, post-run
//! verification and the final report. Everything here talks to the target
//! through [`stampede_http::TargetClient`], so a run can be pointed at an
//! in-memory fake as easily as at a live service.

pub mod deadline;
pub mod error;
pub mod gate;
pub mod generator;
pub mod issue;
mod observe;
pub mod pacing;
pub mod provision;
pub mod report;
pub mod scenario;
pub mod verify;

// Re-export main types for convenience
pub use deadline::{RunDeadline, StopSignal};
pub use error::{RunError, RunResult};
pub use gate::{Admission, GatePollWorkload, GatePoller, GateSpikeWorkload};
pub use generator::{
    run_constant_arrival, run_per_actor, run_ramping_workers, GeneratorStats, Iteration, Workload,
};
pub use issue::{ActorSelection, CouponIssue};
pub use pacing::{ArrivalSchedule, LinearProfile};
pub use provision::{provision, Provisioned};
pub use report::RunReport;
pub use scenario::Scenario;
pub use verify::Verifier;
