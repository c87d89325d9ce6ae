use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::ProblemDetails;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;

pub use reqwest::Method;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// A single backend call. `path` is either absolute or relative to the
/// client's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ResourceRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            return Ok(self);
        }
        let title = ProblemDetails::from_body(&self.body).and_then(|problem| problem.title);
        Err(FetchError::Status {
            status: self.status,
            title,
        })
    }
}

/// Transport seam used by every view-state component.
///
/// Implementors only provide [`ResourceClient::send`]; status and body
/// handling live in the provided methods so every transport classifies
/// failures the same way. No retries happen at this layer.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn send(&self, request: &ResourceRequest) -> Result<RawResponse, FetchError>;

    async fn fetch_json(&self, request: &ResourceRequest) -> Result<Value, FetchError> {
        let response = self.send(request).await?.error_for_status()?;
        serde_json::from_slice(&response.body).map_err(|err| FetchError::Parse(err.to_string()))
    }

    /// Issues a state-changing call. Any 2xx counts as success and the body
    /// is ignored.
    async fn execute(&self, request: &ResourceRequest) -> Result<u16, FetchError> {
        let response = self.send(request).await?.error_for_status()?;
        Ok(response.status)
    }
}

pub fn decode_envelope<T: DeserializeOwned>(value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|err| FetchError::Parse(err.to_string()))
}

pub struct HttpResourceClient {
    http: Client,
    base_url: Url,
}

impl HttpResourceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut base_url = Url::parse(base_url).map_err(|err| FetchError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::transport)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute);
        }
        self.base_url
            .join(path)
            .map_err(|err| FetchError::InvalidUrl {
                url: path.to_string(),
                reason: err.to_string(),
            })
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn send(&self, request: &ResourceRequest) -> Result<RawResponse, FetchError> {
        let url = self.resolve(&request.path)?;
        debug!(method = %request.method, %url, "sending resource request");

        let response = self
            .http
            .request(request.method.clone(), url.clone())
            .query(&request.query)
            .send()
            .await
            .map_err(|err| {
                warn!(method = %request.method, %url, error = %err, "resource request failed");
                FetchError::transport(err)
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(FetchError::transport)?;
        debug!(method = %request.method, %url, status, "resource response received");

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "tests/resource_client_tests.rs"]
mod tests;
