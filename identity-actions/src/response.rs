//! Response body shared by every action endpoint.
//!
//! The identity platform reads `actionStatus` first and then looks for the
//! failure or error fields that go with it. Absent fields are omitted rather
//! than sent as `null`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Success,
    Failed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Replace,
}

/// A patch applied by the platform to the artifact being issued.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub op: OperationKind,
    pub path: String,
    pub value: serde_json::Value,
}

impl Operation {
    pub fn add(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self { op: OperationKind::Add, path: path.into(), value }
    }

    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self { op: OperationKind::Replace, path: path.into(), value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub action_status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<Operation>,
}

impl ActionResponse {
    fn with_status(action_status: ActionStatus) -> Self {
        Self {
            action_status,
            failure_reason: None,
            failure_description: None,
            error: None,
            error_message: None,
            error_description: None,
            message: None,
            operations: Vec::new(),
        }
    }

    pub fn success() -> Self {
        Self::with_status(ActionStatus::Success)
    }

    /// The action ran and the platform should refuse the operation.
    pub fn failed(reason: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            failure_reason: Some(reason.into()),
            failure_description: Some(description.into()),
            ..Self::with_status(ActionStatus::Failed)
        }
    }

    /// The action could not reach a decision.
    pub fn error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            error_description: Some(description.into()),
            ..Self::with_status(ActionStatus::Error)
        }
    }

    /// Error shape used by the token issuance action, which reports `errorMessage`.
    pub fn server_error(description: impl Into<String>) -> Self {
        Self {
            error_message: Some("server_error".to_string()),
            error_description: Some(description.into()),
            ..Self::with_status(ActionStatus::Error)
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_operations(mut self, operations: Vec<Operation>) -> Self {
        self.operations = operations;
        self
    }

    pub fn into_reply(self, status: StatusCode) -> ActionReply {
        ActionReply { status, body: self }
    }
}

/// An action response paired with the HTTP status it is sent with.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReply {
    pub status: StatusCode,
    pub body: ActionResponse,
}

impl IntoResponse for ActionReply {
    fn into_response(self) -> Response {
        tracing::debug!(
            target: "identity_actions.response",
            status = self.status.as_u16(),
            action_status = ?self.body.action_status,
            failure_reason = self.body.failure_reason.as_deref(),
            error = self.body.error.as_deref().or(self.body.error_message.as_deref()),
            "Action response sent"
        );
        (self.status, Json(self.body)).into_response()
    }
}
