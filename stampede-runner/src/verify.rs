//! Post-run ordering verification

use crate::error::{RunError, RunResult};
use stampede_config::OrderingMode;
use stampede_core::{check_ordering, OrderingVerdict, ResourceId};
use stampede_http::CouponApi;
use std::time::Duration;
use tracing::{error, info};

/// Fetches the completion log of a coupon and checks its ordering
pub struct Verifier {
    api: CouponApi,
    mode: OrderingMode,
    quantity: u64,
    timeout: Duration,
}

impl Verifier {
    pub fn new(api: CouponApi, mode: OrderingMode, quantity: u64, timeout: Duration) -> Self {
        Self {
            api,
            mode,
            quantity,
            timeout,
        }
    }

    /// A broken channel (timeout, non-200, missing `result`, malformed
    /// entries) is an error; an unordered log is a verdict.
    pub async fn verify(&self, coupon_id: &ResourceId) -> RunResult<OrderingVerdict> {
        let log = tokio::time::timeout(self.timeout, self.api.verification_logs(coupon_id))
            .await
            .map_err(|_| RunError::VerificationTimeout(self.timeout))?
            .map_err(RunError::VerificationChannel)?;

        let sequence: Vec<u64> = log.iter().map(|entry| entry.request_sequence).collect();
        let verdict = check_ordering(&sequence, self.mode, self.quantity);

        match &verdict.violation {
            None => info!(
                coupon_id = %coupon_id,
                mode = %self.mode,
                completions = sequence.len(),
                "Completion log ordering holds"
            ),
            Some(violation) => error!(
                coupon_id = %coupon_id,
                mode = %self.mode,
                violation = %violation,
                sequence = ?verdict.sequence,
                "Completion log ordering violated"
            ),
        }

        Ok(verdict)
    }
}
