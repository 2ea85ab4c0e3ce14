//! Request timing shared by every workload

use stampede_core::{RunMetrics, TargetResponse};
use stampede_http::HttpError;
use std::future::Future;
use tokio::time::Instant;

/// Await one exchange and feed `http_req_duration` / `http_req_failed`.
///
/// A request counts as failed when no response arrived or the status is
/// 400 or above; duration is only sampled for answered requests.
pub(crate) async fn observe<F>(metrics: &RunMetrics, call: F) -> Result<TargetResponse, HttpError>
where
    F: Future<Output = Result<TargetResponse, HttpError>>,
{
    let started = Instant::now();
    let exchange = call.await;
    match &exchange {
        Ok(response) => {
            metrics.http_req_duration.add_duration(started.elapsed());
            metrics.http_req_failed.add(response.status >= 400);
        }
        Err(_) => metrics.http_req_failed.add(true),
    }
    exchange
}
