//! Transport-neutral view of a target service response

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// A response as observed by the harness.
///
/// The target wraps every JSON body in `{code, status, message, result}`;
/// `body` is `None` when the payload was empty or not valid JSON, in which
/// case the raw payload is still available in `text`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetResponse {
    pub status: u16,
    pub body: Option<JsonValue>,
    pub text: String,
}

impl TargetResponse {
    /// Build from a status code and raw payload, parsing JSON when possible
    pub fn from_text(status: u16, text: impl Into<String>) -> Self {
        let text = text.into();
        let body = serde_json::from_str(&text).ok();
        Self { status, body, text }
    }

    /// Build from a status code and a JSON body
    pub fn from_json(status: u16, body: JsonValue) -> Self {
        Self {
            status,
            text: body.to_string(),
            body: Some(body),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// The envelope's `message` field, if present and a string
    pub fn message(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(JsonValue::as_str)
    }

    /// The envelope's `result` payload, if present and not null
    pub fn result(&self) -> Option<&JsonValue> {
        self.body
            .as_ref()
            .and_then(|b| b.get("result"))
            .filter(|r| !r.is_null())
    }

    /// Deserialize the `result` payload
    pub fn result_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.result().map(|r| T::deserialize(r))
    }

    /// A top-level field of the body (for non-enveloped gate responses)
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.body.as_ref().and_then(|b| b.get(name))
    }
}
