use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use serde_json::Value;

use super::json_payload;
use crate::profile::ProfileDecision;
use crate::response::ActionReply;
use crate::server::AppState;

/// Header carrying the shared secret for the profile endpoint.
pub const API_KEY_HEADER: &str = "api-key";

pub async fn profile_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ActionReply {
    let presented = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if !state.profile.authorize(presented) {
        tracing::warn!(target: "identity_actions.profile.unauthorized", "Invalid or missing API key");
        return ProfileDecision::Unauthorized.into_reply();
    }

    let payload = match json_payload(payload) {
        Ok(payload) => payload,
        Err(reply) => return reply,
    };

    state.profile.evaluate(&payload).await.into_reply()
}
