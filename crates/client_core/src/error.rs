use shared::{domain::IssueKey, error::ApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerClientError {
    #[error("issue tracker is not configured")]
    Unavailable,
    #[error("issue key must not be empty")]
    EmptyKey,
    #[error("invalid issue tracker url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("issue tracker url cannot be used as a base: {url}")]
    UnusableBaseUrl { url: String },
    #[error("not authorized to read issue {key}: {error}")]
    Unauthorized { key: IssueKey, error: ApiError },
    #[error("issue {key} not found")]
    NotFound { key: IssueKey },
    #[error("issue tracker rejected lookup of {key}: {error}")]
    Status { key: IssueKey, error: ApiError },
    #[error("issue tracker request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("summary lookup for {key} panicked")]
    LookupPanicked { key: IssueKey },
}

impl TrackerClientError {
    /// Whether retrying with the same key and credentials can succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Status { error, .. } => matches!(
                error.code,
                shared::error::ErrorCode::RateLimited | shared::error::ErrorCode::Internal
            ),
            _ => false,
        }
    }
}
