use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::Utc;
use serde_json::Value;

use super::json_payload;
use crate::response::ActionReply;
use crate::server::AppState;

pub async fn token_issuance(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ActionReply {
    let payload = match json_payload(payload) {
        Ok(payload) => payload,
        Err(reply) => return reply,
    };

    state.token.evaluate(&payload, Utc::now()).await.into_reply()
}
