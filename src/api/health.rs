use axum::{extract::State, Json};
use serde::Serialize;

use crate::constants::API_VERSION;
use crate::models::ApiResponse;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        version: API_VERSION.to_string(),
        environment: state.config.environment.clone(),
    }))
}
