use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::game::state::GameState;

// ==================== FARM RECORD ====================

/// The persisted wrapper around two snapshots: `game_state` moves on every
/// successful save, `previous_game_state` only when a new on-chain session
/// begins. Rows are never deleted, only flagged or blacklisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FarmRecord {
    pub id: i64,
    pub owner: String,
    pub updated_by: String,
    /// The on-chain settlement account holding this farm's balances.
    pub account: String,
    pub session_id: String,
    pub game_state: Json<GameState>,
    pub previous_game_state: Json<GameState>,
    pub flagged_count: i32,
    pub verify_at: DateTime<Utc>,
    pub blacklisted_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FarmRecord {
    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted_at.is_some()
    }

    pub fn owned_by(&self, address: &str) -> bool {
        self.owner.eq_ignore_ascii_case(address)
    }
}

// ==================== API ENVELOPE ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
