use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::IssueKey,
    error::{ApiError, ErrorCode},
};

/// Response of `GET /rest/api/2/issue/{key}?fields=summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSummaryResponse {
    pub key: IssueKey,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
}

/// Error body Jira returns alongside non-2xx statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraErrorResponse {
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: Map<String, Value>,
}

impl JiraErrorResponse {
    pub fn message(&self) -> String {
        let field_errors = self.errors.iter().map(|(field, value)| match value {
            Value::String(text) => format!("{field}: {text}"),
            other => format!("{field}: {other}"),
        });
        self.error_messages
            .iter()
            .cloned()
            .chain(field_errors)
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_api_error(self, status: u16) -> ApiError {
        let message = self.message();
        let message = if message.is_empty() {
            format!("issue tracker responded with status {status}")
        } else {
            message
        };
        ApiError::new(ErrorCode::from_http_status(status), message)
    }
}
