use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    game::state::GameState,
    models::ApiResponse,
};

use super::{require_signed_sender, AppState};

// ==================== REQUEST/RESPONSE TYPES ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub farm_id: u64,
    pub session_id: String,
    pub sender: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub farm: GameState,
}

// ==================== HANDLERS ====================

/// POST /api/v1/session/start
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<ApiResponse<StartSessionResponse>>> {
    let now = Utc::now();

    // 1. Authenticate the caller
    require_signed_sender(&req.sender, &req.signature, now)?;

    // 2. Reconcile the cached session against the supplied on-chain id
    let farm = state
        .sessions
        .start(req.farm_id, &req.sender, &req.session_id, now)
        .await?;

    Ok(Json(ApiResponse::success(StartSessionResponse { farm })))
}
