use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use pwned_range::{CredentialInput, InvalidInput, Outcome};
use serde_json::Value;

use super::json_payload;
use crate::response::{ActionReply, ActionResponse};
use crate::server::AppState;

/// Reads `event.user.updatingCredential`. Anything that isn't shaped like a
/// credential counts as absent.
fn updating_credential(payload: &Value) -> Option<CredentialInput> {
    payload
        .pointer("/event/user/updatingCredential")
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

pub async fn password_check(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ActionReply {
    let payload = match json_payload(payload) {
        Ok(payload) => payload,
        Err(reply) => return reply,
    };

    let credential = updating_credential(&payload);
    let outcome = state.checker.check(credential.as_ref()).await;

    match &outcome {
        Outcome::Compromised { occurrences } => tracing::info!(
            target: "identity_actions.password.compromised",
            occurrences,
            "Password update rejected"
        ),
        Outcome::InvalidInput(invalid) => tracing::info!(
            target: "identity_actions.password.invalid_input",
            reason = invalid.reason(),
            "Password update request rejected"
        ),
        _ => {}
    }

    reply_for_outcome(&outcome)
}

/// Renders a password check outcome as the action response.
pub fn reply_for_outcome(outcome: &Outcome) -> ActionReply {
    match outcome {
        Outcome::Compromised { .. } => ActionResponse::failed(
            "password_compromised",
            "The provided password is compromised.",
        )
        .into_reply(StatusCode::OK),
        Outcome::Clean => ActionResponse::success()
            .with_message("Password is not compromised.")
            .into_reply(StatusCode::OK),
        Outcome::InvalidInput(InvalidInput::NoPasswordCredential) => {
            ActionResponse::error("invalid_credential", "No password credential found.")
                .into_reply(StatusCode::BAD_REQUEST)
        }
        Outcome::InvalidInput(InvalidInput::BadEncoding) => {
            ActionResponse::error("invalid_credential", "Expects the encrypted credential.")
                .into_reply(StatusCode::BAD_REQUEST)
        }
        Outcome::UpstreamError { status, message } => {
            let error = if outcome.is_rate_limited() { "rate_limited" } else { "upstream_error" };
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            ActionResponse::error(error, message.as_str()).into_reply(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_updating_credential_extraction() {
        let payload = json!({
            "actionType": "PRE_UPDATE_PASSWORD",
            "event": {"user": {"id": "u1", "updatingCredential": {
                "type": "PASSWORD", "format": "HASH", "value": "cGFzc3dvcmQ="
            }}}
        });

        let credential = updating_credential(&payload).unwrap();
        assert_eq!(credential.plaintext(), Ok("password".to_string()));
    }

    #[test]
    fn test_malformed_credential_is_absent() {
        assert!(updating_credential(&json!({})).is_none());
        assert!(
            updating_credential(&json!({"event": {"user": {"updatingCredential": "password"}}}))
                .is_none()
        );
        assert!(
            updating_credential(&json!({"event": {"user": {"updatingCredential": {"value": 7}}}}))
                .is_none()
        );
    }

    #[test]
    fn test_outcome_replies() {
        let reply = reply_for_outcome(&Outcome::Compromised { occurrences: 3 });
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body.failure_reason.as_deref(), Some("password_compromised"));

        let reply = reply_for_outcome(&Outcome::Clean);
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body.message.as_deref(), Some("Password is not compromised."));

        let reply = reply_for_outcome(&Outcome::InvalidInput(InvalidInput::BadEncoding));
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body.error_description.as_deref(), Some("Expects the encrypted credential."));

        let reply = reply_for_outcome(&Outcome::UpstreamError { status: 429, message: "slow down".into() });
        assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(reply.body.error.as_deref(), Some("rate_limited"));

        let reply = reply_for_outcome(&Outcome::UpstreamError { status: 500, message: "io".into() });
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body.error.as_deref(), Some("upstream_error"));
    }
}
