//! Route handlers for the action endpoints.

mod password;
mod profile;
mod token;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::response::{ActionReply, ActionResponse};

pub use password::{password_check, reply_for_outcome};
pub use profile::profile_update;
pub use token::token_issuance;

/// Liveness check.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "message": "Service is running."}))
}

/// Unwraps a JSON body, or builds the `invalid_request` reply every action uses.
///
/// Bodies over the router's limit keep their 413 status.
fn json_payload(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ActionReply> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        tracing::warn!(
            target: "identity_actions.invalid_request",
            error = %rejection,
            status = %rejection.status(),
            "Rejected request body"
        );
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ActionResponse::error("request_too_large", "Request body exceeds the 100 KiB limit.")
                .into_reply(StatusCode::PAYLOAD_TOO_LARGE)
        } else {
            ActionResponse::error("invalid_request", "Invalid JSON payload.")
                .into_reply(StatusCode::BAD_REQUEST)
        }
    })
}
