//! Coupon issuance service calls

use super::endpoint_url;
use crate::client::{TargetClient, TargetRequest};
use crate::errors::HttpError;
use serde::Deserialize;
use serde_json::json;
use stampede_core::{
    ActorId, AllocationRequest, CompletionLogEntry, CreatorId, EntityId, ResourceId,
    TargetResponse,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct VerificationLogs {
    #[serde(default)]
    completions: Option<Vec<CompletionLogEntry>>,
}

/// Client for the allocation service
#[derive(Clone)]
pub struct CouponApi {
    client: Arc<dyn TargetClient>,
    base_url: String,
}

impl CouponApi {
    pub fn new(client: Arc<dyn TargetClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn create_user(&self, name: &str) -> Result<ActorId, HttpError> {
        let request = TargetRequest::post(endpoint_url(&self.base_url, "/api/users"))
            .json(json!({ "name": name }));
        let response = self.client.send(request).await?;
        required_id(&response, "create user", "userId").map(ActorId)
    }

    pub async fn create_creator(&self, name: &str) -> Result<CreatorId, HttpError> {
        let request = TargetRequest::post(endpoint_url(&self.base_url, "/api/creators"))
            .json(json!({ "name": name }));
        let response = self.client.send(request).await?;
        required_id(&response, "create creator", "creatorId").map(CreatorId)
    }

    pub async fn create_coupon(
        &self,
        creator_id: &CreatorId,
        quantity: u64,
        coupon_name: &str,
    ) -> Result<ResourceId, HttpError> {
        let request = TargetRequest::post(endpoint_url(&self.base_url, "/api/coupons")).json(
            json!({
                "creatorId": creator_id,
                "quantity": quantity,
                "couponName": coupon_name,
            }),
        );
        let response = self.client.send(request).await?;
        required_id(&response, "create coupon", "couponId").map(ResourceId)
    }

    /// Issue one coupon. Every HTTP status comes back as `Ok` so the
    /// classifier sees it.
    pub async fn issue_coupon(
        &self,
        request: &AllocationRequest,
    ) -> Result<TargetResponse, HttpError> {
        let path = format!("/api/coupons/{}", request.resource_id);
        let request = TargetRequest::post(endpoint_url(&self.base_url, &path))
            .json(json!({ "userId": request.actor_id }));
        self.client.send(request).await
    }

    /// Fetch the completion log of a coupon.
    ///
    /// A missing `completions` list is an empty log; a non-200 status, a
    /// missing `result` or an entry without `requestSequence` is an error.
    pub async fn verification_logs(
        &self,
        coupon_id: &ResourceId,
    ) -> Result<Vec<CompletionLogEntry>, HttpError> {
        let endpoint = "verification logs";
        let path = format!("/api/coupons/{}/verification-logs", coupon_id);
        let response = self
            .client
            .send(TargetRequest::get(endpoint_url(&self.base_url, &path)))
            .await?;

        ensure_ok(&response, endpoint)?;
        let logs: VerificationLogs = response
            .result_as::<VerificationLogs>()
            .ok_or_else(|| missing(endpoint, "result"))??;

        let completions = logs.completions.unwrap_or_default();
        debug!(coupon_id = %coupon_id, entries = completions.len(), "Fetched completion log");
        Ok(completions)
    }
}

fn ensure_ok(response: &TargetResponse, endpoint: &str) -> Result<(), HttpError> {
    if response.is_ok() {
        return Ok(());
    }
    Err(HttpError::UnexpectedStatus {
        endpoint: endpoint.to_string(),
        status: response.status,
        message: response
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| response.text.clone()),
    })
}

fn missing(endpoint: &str, field: &str) -> HttpError {
    HttpError::MissingField {
        endpoint: endpoint.to_string(),
        field: field.to_string(),
    }
}

/// Pull `result.<field>` out of a setup response
fn required_id(
    response: &TargetResponse,
    endpoint: &str,
    field: &str,
) -> Result<EntityId, HttpError> {
    ensure_ok(response, endpoint)?;
    let value = response
        .result()
        .and_then(|result| result.get(field))
        .filter(|value| !value.is_null())
        .ok_or_else(|| missing(endpoint, field))?;
    Ok(EntityId::deserialize(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_id_reads_result_field() {
        let response = TargetResponse::from_json(
            200,
            json!({"code": 200, "message": "OK", "result": {"userId": 12}}),
        );
        assert_eq!(
            required_id(&response, "create user", "userId").unwrap(),
            EntityId::Number(12)
        );
    }

    #[test]
    fn test_required_id_rejects_failures() {
        let rejected = TargetResponse::from_json(400, json!({"code": 400, "message": "bad name"}));
        match required_id(&rejected, "create user", "userId") {
            Err(HttpError::UnexpectedStatus { status, message, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad name");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let empty = TargetResponse::from_json(200, json!({"code": 200, "result": null}));
        assert!(matches!(
            required_id(&empty, "create user", "userId"),
            Err(HttpError::MissingField { .. })
        ));
    }
}
