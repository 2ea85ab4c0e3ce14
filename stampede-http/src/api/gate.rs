//! Waiting-room gate calls

use super::endpoint_url;
use crate::client::{TargetClient, TargetRequest};
use crate::errors::HttpError;
use serde_json::Value as JsonValue;
use stampede_core::{GateStatus, TargetResponse};
use std::sync::Arc;

/// Body of an enqueue response: `{status: ENQUEUED | ALREADY_ENQUEUED, rank}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueAck {
    pub status: String,
    pub rank: Option<u64>,
}

impl EnqueueAck {
    pub fn from_response(response: &TargetResponse) -> Option<Self> {
        let status = response.field("status")?.as_str()?.to_string();
        let rank = response.field("rank").and_then(JsonValue::as_u64);
        Some(Self { status, rank })
    }
}

/// Client for one gate event
#[derive(Clone)]
pub struct GateApi {
    client: Arc<dyn TargetClient>,
    base_url: String,
    event_id: u64,
}

impl GateApi {
    pub fn new(client: Arc<dyn TargetClient>, base_url: impl Into<String>, event_id: u64) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            event_id,
        }
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    pub async fn enqueue(&self, user_id: u64) -> Result<TargetResponse, HttpError> {
        let path = format!("/gate/events/{}/enqueue", self.event_id);
        let request =
            TargetRequest::post(endpoint_url(&self.base_url, &path)).query("userId", user_id);
        self.client.send(request).await
    }

    pub async fn rank(&self, user_id: u64) -> Result<TargetResponse, HttpError> {
        let path = format!("/gate/events/{}/rank", self.event_id);
        let request =
            TargetRequest::get(endpoint_url(&self.base_url, &path)).query("userId", user_id);
        self.client.send(request).await
    }

    /// Status carried by a rank response; `None` for non-200 or bodies
    /// without a `status` string
    pub fn parse_status(response: &TargetResponse) -> Option<GateStatus> {
        if !response.is_ok() {
            return None;
        }
        let status = response.field("status")?.as_str()?;
        let rank = response.field("rank").and_then(JsonValue::as_u64);
        Some(GateStatus::from_fields(status, rank))
    }

    /// Spike check: 200 and the body mentions `ENQUEUED` or `ALREADY`
    pub fn is_enqueued(response: &TargetResponse) -> bool {
        response.is_ok()
            && (response.text.contains("ENQUEUED") || response.text.contains("ALREADY"))
    }
}
