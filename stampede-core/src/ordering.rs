//! Ordering predicates over the completion log

use serde::Serialize;
use stampede_config::OrderingMode;
use thiserror::Error;

/// First point at which a completion sequence breaks its predicate
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderingViolation {
    #[error("expected {expected} completions, found {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("sequence[{index}] = {current} does not exceed the preceding {previous}")]
    NotIncreasing {
        index: usize,
        previous: u64,
        current: u64,
    },

    #[error("sequence[{index}] = {actual}, expected {expected}")]
    OutOfPlace {
        index: usize,
        expected: u64,
        actual: u64,
    },
}

/// Outcome of checking one completion log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderingVerdict {
    pub mode: OrderingMode,
    pub sequence: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<OrderingViolation>,
}

impl OrderingVerdict {
    pub fn holds(&self) -> bool {
        self.violation.is_none()
    }
}

/// Check `sequence` against `mode`.
///
/// `quantity` is only consulted in dense mode, where the log must be exactly
/// `1..=quantity`.
pub fn check_ordering(sequence: &[u64], mode: OrderingMode, quantity: u64) -> OrderingVerdict {
    let violation = match mode {
        OrderingMode::Monotonic => first_inversion(sequence),
        OrderingMode::Dense => first_gap(sequence, quantity),
    };

    OrderingVerdict {
        mode,
        sequence: sequence.to_vec(),
        violation,
    }
}

fn first_inversion(sequence: &[u64]) -> Option<OrderingViolation> {
    sequence
        .windows(2)
        .enumerate()
        .find(|(_, pair)| pair[0] >= pair[1])
        .map(|(i, pair)| OrderingViolation::NotIncreasing {
            index: i + 1,
            previous: pair[0],
            current: pair[1],
        })
}

fn first_gap(sequence: &[u64], quantity: u64) -> Option<OrderingViolation> {
    if sequence.len() as u64 != quantity {
        return Some(OrderingViolation::LengthMismatch {
            expected: quantity,
            actual: sequence.len() as u64,
        });
    }

    sequence
        .iter()
        .enumerate()
        .find(|(i, value)| **value != *i as u64 + 1)
        .map(|(i, value)| OrderingViolation::OutOfPlace {
            index: i,
            expected: i as u64 + 1,
            actual: *value,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_accepts_exact_range() {
        let sequence: Vec<u64> = (1..=30).collect();
        assert!(check_ordering(&sequence, OrderingMode::Dense, 30).holds());
    }

    #[test]
    fn test_dense_rejects_gap() {
        let verdict = check_ordering(&[1, 2, 4], OrderingMode::Dense, 3);
        assert_eq!(
            verdict.violation,
            Some(OrderingViolation::OutOfPlace {
                index: 2,
                expected: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn test_dense_rejects_inversion() {
        let verdict = check_ordering(&[2, 1, 3], OrderingMode::Dense, 3);
        assert!(!verdict.holds());
    }

    #[test]
    fn test_dense_rejects_wrong_length() {
        let verdict = check_ordering(&[1, 2, 3], OrderingMode::Dense, 4);
        assert_eq!(
            verdict.violation,
            Some(OrderingViolation::LengthMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert!(!check_ordering(&[1, 2, 3, 4], OrderingMode::Dense, 3).holds());
    }

    #[test]
    fn test_dense_empty_log_for_zero_quantity() {
        assert!(check_ordering(&[], OrderingMode::Dense, 0).holds());
        assert!(!check_ordering(&[], OrderingMode::Dense, 1).holds());
    }

    #[test]
    fn test_monotonic_accepts_gaps() {
        assert!(check_ordering(&[5, 9, 20], OrderingMode::Monotonic, 0).holds());
        assert!(check_ordering(&[], OrderingMode::Monotonic, 0).holds());
        assert!(check_ordering(&[7], OrderingMode::Monotonic, 0).holds());
    }

    #[test]
    fn test_monotonic_rejects_duplicates_and_inversions() {
        let verdict = check_ordering(&[5, 5, 9], OrderingMode::Monotonic, 0);
        assert_eq!(
            verdict.violation,
            Some(OrderingViolation::NotIncreasing {
                index: 1,
                previous: 5,
                current: 5
            })
        );
        assert!(!check_ordering(&[9, 5, 20], OrderingMode::Monotonic, 0).holds());
    }

    #[test]
    fn test_violation_message() {
        let violation = OrderingViolation::NotIncreasing {
            index: 2,
            previous: 9,
            current: 5,
        };
        assert_eq!(
            violation.to_string(),
            "sequence[2] = 5 does not exceed the preceding 9"
        );
    }
}
