use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, StatusCode};
use shared::{
    domain::IssueKey,
    error::ErrorCode,
    protocol::{IssueSummaryResponse, JiraErrorResponse},
};
use tracing::debug;
use url::Url;

use crate::error::TrackerClientError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait IssueTrackerClient: Send + Sync {
    async fn get_summary(&self, key: &IssueKey) -> Result<String, TrackerClientError>;

    /// Browser URL for the issue, or `None` when it cannot be opened.
    fn issue_url(&self, key: &IssueKey) -> Option<String>;

    fn is_available(&self) -> bool {
        true
    }
}

/// Stand-in used when no tracker is configured.
pub struct MissingIssueTracker;

#[async_trait]
impl IssueTrackerClient for MissingIssueTracker {
    async fn get_summary(&self, _key: &IssueKey) -> Result<String, TrackerClientError> {
        Err(TrackerClientError::Unavailable)
    }

    fn issue_url(&self, _key: &IssueKey) -> Option<String> {
        None
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct JiraCredentials {
    pub username: String,
    pub api_token: String,
}

pub struct JiraClient {
    http: Client,
    base_url: Url,
    credentials: Option<JiraCredentials>,
}

impl JiraClient {
    pub fn new(
        base_url: &str,
        credentials: Option<JiraCredentials>,
    ) -> Result<Self, TrackerClientError> {
        Self::with_timeout(base_url, credentials, DEFAULT_REQUEST_TIMEOUT)
    }

    /// A stalled request fails as a transient [`TrackerClientError::Http`]
    /// once `timeout` elapses.
    pub fn with_timeout(
        base_url: &str,
        credentials: Option<JiraCredentials>,
        timeout: Duration,
    ) -> Result<Self, TrackerClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_http_client(http, base_url, credentials)
    }

    pub fn with_http_client(
        http: Client,
        base_url: &str,
        credentials: Option<JiraCredentials>,
    ) -> Result<Self, TrackerClientError> {
        let base_url = Url::parse(base_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(TrackerClientError::UnusableBaseUrl {
                url: base_url.into(),
            });
        }
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TrackerClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TrackerClientError::UnusableBaseUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl IssueTrackerClient for JiraClient {
    async fn get_summary(&self, key: &IssueKey) -> Result<String, TrackerClientError> {
        if key.is_empty() {
            return Err(TrackerClientError::EmptyKey);
        }

        let url = self.endpoint(&["rest", "api", "2", "issue", key.as_str()])?;
        let mut request = self
            .http
            .get(url)
            .query(&[("fields", "summary")])
            .header(ACCEPT, "application/json");
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.api_token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(err) => {
                    debug!(issue = %key, %status, "failed to read error body: {err}");
                    Default::default()
                }
            };
            return Err(status_error(key, status, &body));
        }

        let body: IssueSummaryResponse = response.json().await?;
        debug!(issue = %key, "fetched issue summary");
        Ok(body.fields.summary)
    }

    fn issue_url(&self, key: &IssueKey) -> Option<String> {
        if key.is_empty() {
            return None;
        }
        self.endpoint(&["browse", key.as_str()])
            .ok()
            .map(String::from)
    }
}

fn status_error(key: &IssueKey, status: StatusCode, body: &[u8]) -> TrackerClientError {
    let error = serde_json::from_slice::<JiraErrorResponse>(body)
        .unwrap_or_default()
        .into_api_error(status.as_u16());
    match error.code {
        ErrorCode::Unauthorized | ErrorCode::Forbidden => TrackerClientError::Unauthorized {
            key: key.clone(),
            error,
        },
        ErrorCode::NotFound => TrackerClientError::NotFound { key: key.clone() },
        _ => TrackerClientError::Status {
            key: key.clone(),
            error,
        },
    }
}

#[cfg(test)]
#[path = "tests/tracker_client_tests.rs"]
mod tests;
