//! `/api/messaging/status`: session status, starting the session on first call.

use super::{AppState, Tenant};
use crate::messaging::SessionState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_ready: bool,
    pub status: SessionState,
    pub pairing_challenge: Option<String>,
}

pub async fn status(State(state): State<AppState>, Tenant(tenant): Tenant) -> Json<StatusResponse> {
    let status = state.sessions.ensure_session(&tenant);
    Json(StatusResponse {
        is_ready: status.is_ready(),
        status: status.state,
        pairing_challenge: status.pairing_challenge,
    })
}
