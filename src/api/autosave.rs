use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    game::actions::GameAction,
    game::state::GameState,
    models::ApiResponse,
    services::autosave::SaveOutcome,
};

use super::{require_signed_sender, AppState};

// ==================== REQUEST/RESPONSE TYPES ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveRequest {
    pub farm_id: u64,
    pub sender: String,
    pub signature: String,
    pub actions: Vec<GameAction>,
    pub captcha: Option<String>,
}

/// `verified: false` means the anti-fraud gate wants a CAPTCHA first; the
/// batch was not applied and the caller should retry with a token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm: Option<GameState>,
}

// ==================== HANDLERS ====================

/// POST /api/v1/autosave
pub async fn autosave(
    State(state): State<AppState>,
    Json(req): Json<AutosaveRequest>,
) -> Result<Json<ApiResponse<AutosaveResponse>>> {
    let now = Utc::now();

    // 1. Authenticate the caller
    require_signed_sender(&req.sender, &req.signature, now)?;

    // 2. Replay the batch through the anti-fraud gate
    let outcome = state
        .autosave
        .save(
            req.farm_id,
            &req.sender,
            &req.actions,
            req.captcha.as_deref(),
            now,
        )
        .await?;

    let response = match outcome {
        SaveOutcome::Verified { state, .. } => AutosaveResponse {
            verified: true,
            farm: Some(state),
        },
        SaveOutcome::Unverified => AutosaveResponse {
            verified: false,
            farm: None,
        },
    };
    Ok(Json(ApiResponse::success(response)))
}
