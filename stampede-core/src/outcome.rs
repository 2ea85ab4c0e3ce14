//! Allocation outcome classification

use crate::response::TargetResponse;
use crate::vocabulary::ErrorVocabulary;
use serde::{Deserialize, Serialize};
use stampede_config::ErrorCode;
use std::fmt;
use tracing::warn;

/// Result of exactly one allocation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationOutcome {
    Success,
    /// The actor already holds this coupon
    Duplicate,
    /// Quantity exhausted
    OutOfStock,
    /// Server-side contention timeout
    LockTimeout,
    /// Any other 5xx
    ServerError { status: u16 },
    /// No response was received
    NetworkError,
    /// A response outside the known vocabulary
    Unclassified { status: u16, message: String },
}

impl AllocationOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            AllocationOutcome::Success => OutcomeKind::Success,
            AllocationOutcome::Duplicate => OutcomeKind::Duplicate,
            AllocationOutcome::OutOfStock => OutcomeKind::OutOfStock,
            AllocationOutcome::LockTimeout => OutcomeKind::LockTimeout,
            AllocationOutcome::ServerError { .. } => OutcomeKind::ServerError,
            AllocationOutcome::NetworkError => OutcomeKind::NetworkError,
            AllocationOutcome::Unclassified { .. } => OutcomeKind::Unclassified,
        }
    }
}

/// Counter bucket of an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Duplicate,
    OutOfStock,
    LockTimeout,
    ServerError,
    NetworkError,
    Unclassified,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 7] = [
        OutcomeKind::Success,
        OutcomeKind::Duplicate,
        OutcomeKind::OutOfStock,
        OutcomeKind::LockTimeout,
        OutcomeKind::ServerError,
        OutcomeKind::NetworkError,
        OutcomeKind::Unclassified,
    ];

    /// Metric name used by thresholds and reports
    pub fn metric_name(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "coupon_success_count",
            OutcomeKind::Duplicate => "coupon_duplicate_count",
            OutcomeKind::OutOfStock => "coupon_out_of_stock_count",
            OutcomeKind::LockTimeout => "coupon_lock_timeout_count",
            OutcomeKind::ServerError => "server_error_count",
            OutcomeKind::NetworkError => "network_error_count",
            OutcomeKind::Unclassified => "unclassified_count",
        }
    }

    pub fn from_metric_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.metric_name() == name)
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric_name())
    }
}

/// Maps an observed exchange to exactly one outcome.
///
/// First match wins: transport failure, then a vocabulary hit on
/// `(status, message)`, then any other 5xx, then 200, and everything else
/// falls into the unclassified bucket.
#[derive(Debug, Clone, Default)]
pub struct OutcomeClassifier {
    vocabulary: ErrorVocabulary,
}

impl OutcomeClassifier {
    pub fn new(vocabulary: ErrorVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn classify<E>(&self, exchange: &Result<TargetResponse, E>) -> AllocationOutcome {
        match exchange {
            Ok(response) => self.classify_response(response),
            Err(_) => AllocationOutcome::NetworkError,
        }
    }

    pub fn classify_response(&self, response: &TargetResponse) -> AllocationOutcome {
        let status = response.status;
        let message = response.message().unwrap_or("");

        if let Some(code) = self.vocabulary.lookup(status, message) {
            return match code {
                ErrorCode::AlreadyAllocated => AllocationOutcome::Duplicate,
                ErrorCode::InsufficientStock => AllocationOutcome::OutOfStock,
                ErrorCode::LockWaitTimeout => AllocationOutcome::LockTimeout,
            };
        }

        if status >= 500 {
            return AllocationOutcome::ServerError { status };
        }

        if status == 200 {
            return AllocationOutcome::Success;
        }

        warn!(status, message, "Unclassified allocation response");
        AllocationOutcome::Unclassified {
            status,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(status: u16, message: &str) -> TargetResponse {
        TargetResponse::from_json(status, json!({"code": status, "message": message, "result": null}))
    }

    #[test]
    fn test_transport_failure_is_network_error() {
        let classifier = OutcomeClassifier::default();
        let exchange: Result<TargetResponse, &str> = Err("connection reset");
        assert_eq!(classifier.classify(&exchange), AllocationOutcome::NetworkError);
    }

    #[test]
    fn test_vocabulary_outcomes() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify_response(&envelope(400, "이미 발급받은 쿠폰입니다.")),
            AllocationOutcome::Duplicate
        );
        assert_eq!(
            classifier.classify_response(&envelope(400, "쿠폰 재고가 부족합니다.")),
            AllocationOutcome::OutOfStock
        );
        assert_eq!(
            classifier.classify_response(&envelope(500, "쿠폰 LOCK 획득 대기 시간이 초과되었습니다.")),
            AllocationOutcome::LockTimeout
        );
    }

    #[test]
    fn test_status_fallbacks() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify_response(&envelope(200, "OK")),
            AllocationOutcome::Success
        );
        assert_eq!(
            classifier.classify_response(&envelope(503, "쿠폰 재고가 부족합니다.")),
            AllocationOutcome::ServerError { status: 503 }
        );
        assert_eq!(
            classifier.classify_response(&TargetResponse::from_text(502, "")),
            AllocationOutcome::ServerError { status: 502 }
        );
    }

    #[test]
    fn test_unknown_responses_are_counted_not_dropped() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify_response(&envelope(400, "some new validation error")),
            AllocationOutcome::Unclassified {
                status: 400,
                message: "some new validation error".to_string()
            }
        );
        assert_eq!(
            classifier
                .classify_response(&TargetResponse::from_text(404, "not found"))
                .kind(),
            OutcomeKind::Unclassified
        );
    }

    #[test]
    fn test_unparseable_body_uses_empty_message() {
        let classifier = OutcomeClassifier::default();
        let response = TargetResponse::from_text(200, "not json");
        assert_eq!(classifier.classify_response(&response), AllocationOutcome::Success);
    }

    #[test]
    fn test_custom_vocabulary_replaces_literals() {
        use stampede_config::VocabularyEntry;
        let classifier = OutcomeClassifier::new(ErrorVocabulary::new(&[VocabularyEntry::new(
            ErrorCode::InsufficientStock,
            409,
            "SOLD_OUT",
        )]));
        assert_eq!(
            classifier.classify_response(&envelope(409, "SOLD_OUT")),
            AllocationOutcome::OutOfStock
        );
        assert_eq!(
            classifier.classify_response(&envelope(400, "쿠폰 재고가 부족합니다.")).kind(),
            OutcomeKind::Unclassified
        );
    }

    #[test]
    fn test_metric_names_round_trip() {
        for kind in OutcomeKind::ALL {
            assert_eq!(OutcomeKind::from_metric_name(kind.metric_name()), Some(kind));
        }
    }
}
