//! Core domain model for stampede
//!
//! This crate holds everything that is independent of transport and
//! scheduling: the entities exchanged with the target services, the
//! outcome classifier and its error vocabulary, the lock-free outcome
//! counters, run metrics, threshold evaluation and the completion-log
//! ordering predicates.

pub mod counters;
pub mod metrics;
pub mod model;
pub mod ordering;
pub mod outcome;
pub mod response;
pub mod threshold;
pub mod vocabulary;

// Re-export main types for convenience
pub use counters::{OutcomeCounters, OutcomeTally};
pub use metrics::{MetricValue, MetricsSnapshot, RateMetric, RateSummary, RunMetrics, Trend, TrendSnapshot};
pub use model::{
    ActorId, AllocationRequest, CompletionLogEntry, CreatorId, EntityId, GateStatus, ResourceId,
    TicketState, WaitTicket,
};
pub use ordering::{check_ordering, OrderingVerdict, OrderingViolation};
pub use outcome::{AllocationOutcome, OutcomeClassifier, OutcomeKind};
pub use response::TargetResponse;
pub use threshold::{Threshold, ThresholdParseError, ThresholdResult, ThresholdSet};
pub use vocabulary::ErrorVocabulary;

pub use stampede_config::{ErrorCode, OrderingMode};
