use thiserror::Error;

/// Failure of a single backend call.
///
/// `Transport` and `Status` are network failures, `Parse` covers bodies that
/// are not the expected JSON. A `Status` with code 404 is how an absent
/// resource is reported; see [`FetchError::is_absent`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP error {status}{}", title_suffix(.title))]
    Status { status: u16, title: Option<String> },
    #[error("invalid response body: {0}")]
    Parse(String),
    #[error("invalid resource url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

fn title_suffix(title: &Option<String>) -> String {
    title
        .as_deref()
        .map(|title| format!(": {title}"))
        .unwrap_or_default()
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend answered 404: the resource was never created.
    pub fn is_absent(&self) -> bool {
        self.status() == Some(404)
    }

    pub(crate) fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
