use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the backend for non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

impl ProblemDetails {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            message: None,
        }
    }

    /// Best-effort parse of an error body; anything that is not a problem
    /// document yields `None`.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Self>(body)
            .ok()
            .filter(|problem| problem.title.is_some())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid timestamp: {0}")]
pub struct TimestampError(pub String);
