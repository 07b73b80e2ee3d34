//! Profile update validation and security alerting.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::response::{ActionReply, ActionResponse};

/// Action type the platform sends for profile updates.
pub const PRE_UPDATE_PROFILE: &str = "PRE_UPDATE_PROFILE";

pub const DEPARTMENT_CLAIM: &str = "http://wso2.org/claims/department";
pub const EMAIL_CLAIM: &str = "http://wso2.org/claims/emailaddress";
pub const MOBILE_CLAIM: &str = "http://wso2.org/claims/mobile";

const UNKNOWN_USER: &str = "Unknown User";

/// Sensitive attribute changes a user is about to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityAlert {
    pub user_id: String,
    pub changes: Vec<String>,
}

impl SecurityAlert {
    pub fn subject(&self) -> &'static str {
        "Sensitive Attribute Update Request"
    }

    pub fn text(&self) -> String {
        format!("User {} is attempting to update:\n\n{}", self.user_id, self.changes.join("\n"))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to deliver security alert: {0}")]
pub struct NotifyError(pub String);

/// Delivers security alerts to whoever watches sensitive profile changes.
#[async_trait]
pub trait SecurityNotifier: Send + Sync {
    async fn notify(&self, alert: &SecurityAlert) -> Result<(), NotifyError>;
}

/// Writes alerts to the structured log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl SecurityNotifier for LogNotifier {
    async fn notify(&self, alert: &SecurityAlert) -> Result<(), NotifyError> {
        tracing::warn!(
            target: "identity_actions.security_alert",
            user_id = %alert.user_id,
            changes = ?alert.changes,
            subject = alert.subject(),
            "Sensitive attribute update requested"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileDecision {
    Allowed,
    Unauthorized,
    InvalidActionType,
    InvalidDepartment,
    NotifyFailed,
}

impl ProfileDecision {
    pub fn into_reply(self) -> ActionReply {
        match self {
            ProfileDecision::Allowed => ActionResponse::success().into_reply(StatusCode::OK),
            ProfileDecision::Unauthorized => {
                ActionResponse::failed("unauthorized", "Invalid or missing API key.")
                    .into_reply(StatusCode::UNAUTHORIZED)
            }
            ProfileDecision::InvalidActionType => {
                ActionResponse::failed("invalid_input", "Invalid actionType provided.")
                    .into_reply(StatusCode::OK)
            }
            ProfileDecision::InvalidDepartment => ActionResponse::failed(
                "invalid_department_input",
                "Provided user department value is invalid.",
            )
            .into_reply(StatusCode::OK),
            ProfileDecision::NotifyFailed => ActionResponse::failed(
                "email_error",
                "Failed to notify security team about sensitive data update.",
            )
            .into_reply(StatusCode::OK),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claim {
    uri: String,
    #[serde(default)]
    value: Value,
}

/// Returns the claim's value as text, or `None` when it is absent or empty.
fn claim_value(claims: &[Claim], uri: &str) -> Option<String> {
    let claim = claims.iter().find(|c| c.uri == uri)?;
    match &claim.value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(Clone)]
pub struct ProfileUpdatePolicy {
    valid_departments: Vec<String>,
    api_key: Option<String>,
    notifier: Arc<dyn SecurityNotifier>,
}

impl ProfileUpdatePolicy {
    pub fn new(valid_departments: Vec<String>, notifier: Arc<dyn SecurityNotifier>) -> Self {
        Self { valid_departments, api_key: None, notifier }
    }

    /// Require callers to present this key in the `api-key` header.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    /// Checks the presented key. Always passes when no key is configured.
    pub fn authorize(&self, presented: Option<&str>) -> bool {
        match &self.api_key {
            Some(expected) => presented
                .is_some_and(|presented| expected.as_bytes().ct_eq(presented.as_bytes()).into()),
            None => true,
        }
    }

    pub async fn evaluate(&self, payload: &Value) -> ProfileDecision {
        if payload.get("actionType").and_then(Value::as_str) != Some(PRE_UPDATE_PROFILE) {
            return ProfileDecision::InvalidActionType;
        }

        let claims: Vec<Claim> = payload
            .pointer("/event/request/claims")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|c| serde_json::from_value(c.clone()).ok())
            .collect();
        let user_id = payload
            .pointer("/event/user/id")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_USER)
            .to_string();

        let department = claim_value(&claims, DEPARTMENT_CLAIM);
        let email = claim_value(&claims, EMAIL_CLAIM);
        let phone = claim_value(&claims, MOBILE_CLAIM);

        if let Some(department) = &department {
            if !self.valid_departments.iter().any(|d| d == department) {
                tracing::info!(
                    target: "identity_actions.profile.invalid_department",
                    %user_id,
                    %department,
                    "Profile update rejected"
                );
                return ProfileDecision::InvalidDepartment;
            }
        }

        let changes: Vec<String> = [("Department", department), ("Email", email), ("Phone", phone)]
            .into_iter()
            .filter_map(|(label, value)| value.map(|v| format!("{label}: {v}")))
            .collect();

        if !changes.is_empty() {
            let alert = SecurityAlert { user_id, changes };
            if let Err(e) = self.notifier.notify(&alert).await {
                tracing::error!(
                    target: "identity_actions.profile.notify_failed",
                    user_id = %alert.user_id,
                    error = %e,
                    "Failed to send security alert"
                );
                return ProfileDecision::NotifyFailed;
            }
        }

        ProfileDecision::Allowed
    }
}
