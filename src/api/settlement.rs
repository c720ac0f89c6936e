use axum::{extract::State, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    error::Result,
    game::items::ItemName,
    models::ApiResponse,
    services::settlement::{SignedSettlement, SignedWithdrawal},
};

use super::{require_signed_sender, AppState};

// ==================== REQUEST/RESPONSE TYPES ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub farm_id: u64,
    pub session_id: String,
    pub sender: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub farm_id: u64,
    pub session_id: String,
    pub sender: String,
    pub signature: String,
    /// Item name -> display-decimal amount to withdraw.
    #[serde(default)]
    pub amounts: BTreeMap<ItemName, Decimal>,
    pub sfl: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub farm_id: u64,
    pub session_id: String,
    pub sender: String,
    pub signature: String,
    pub item: ItemName,
}

// ==================== HANDLERS ====================

/// POST /api/v1/sync
pub async fn sync(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<ApiResponse<SignedSettlement>>> {
    let now = Utc::now();

    require_signed_sender(&req.sender, &req.signature, now)?;

    let signed = state
        .settlement
        .sync(req.farm_id, &req.sender, &req.session_id, now)
        .await?;
    Ok(Json(ApiResponse::success(signed)))
}

/// POST /api/v1/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<ApiResponse<SignedWithdrawal>>> {
    let now = Utc::now();

    require_signed_sender(&req.sender, &req.signature, now)?;

    let items: Vec<(ItemName, Decimal)> = req.amounts.into_iter().collect();
    let signed = state
        .settlement
        .withdraw(
            req.farm_id,
            &req.sender,
            &req.session_id,
            &items,
            req.sfl,
            now,
        )
        .await?;
    Ok(Json(ApiResponse::success(signed)))
}

/// POST /api/v1/mint
pub async fn mint(
    State(state): State<AppState>,
    Json(req): Json<MintRequest>,
) -> Result<Json<ApiResponse<SignedSettlement>>> {
    let now = Utc::now();

    require_signed_sender(&req.sender, &req.signature, now)?;

    let signed = state
        .settlement
        .mint(req.farm_id, &req.sender, &req.session_id, req.item, now)
        .await?;
    Ok(Json(ApiResponse::success(signed)))
}
