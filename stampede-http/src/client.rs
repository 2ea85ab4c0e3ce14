//! HTTP client implementation

use crate::config::HttpConfig;
use crate::errors::HttpError;
use crate::types::HttpMethod;
use reqwest::Client;
use serde_json::Value as JsonValue;
use stampede_core::TargetResponse;
use std::sync::Arc;
use tracing::{debug, trace};

/// One outbound call to a target service
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl TargetRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }
}

/// Transport seam between the harness and the target services.
///
/// Any HTTP status is a successful exchange; `Err` means no response was
/// observed.
#[async_trait::async_trait]
pub trait TargetClient: Send + Sync {
    async fn send(&self, request: TargetRequest) -> Result<TargetResponse, HttpError>;
}

#[async_trait::async_trait]
impl<T: TargetClient + ?Sized> TargetClient for Arc<T> {
    async fn send(&self, request: TargetRequest) -> Result<TargetResponse, HttpError> {
        (**self).send(request).await
    }
}

/// reqwest-backed client over a single shared connection pool
#[derive(Debug, Clone)]
pub struct HttpManager {
    client: Client,
    config: HttpConfig,
}

impl HttpManager {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HttpManager with timeout: {}s",
            config.timeout.as_secs()
        );
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl TargetClient for HttpManager {
    async fn send(&self, request: TargetRequest) -> Result<TargetResponse, HttpError> {
        trace!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(reqwest::Method::from(request.method), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        trace!(status, bytes = text.len(), "Response received");
        Ok(TargetResponse::from_text(status, text))
    }
}
