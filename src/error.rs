use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::game::{reducer::RuleViolation, replay::ReplayError, units::UnitError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Blockchain RPC error: {0}")]
    BlockchainRPC(String),

    #[error("Remote signer error: {0}")]
    Signer(String),

    #[error("Unable to verify account")]
    UnableToVerifyAccount,

    #[error("You are not the owner of this farm")]
    NotFarmOwner,

    #[error("Farm does not exist")]
    FarmNotFound,

    #[error("Farm is blacklisted")]
    Blacklisted,

    #[error("Session has changed")]
    SessionMismatch,

    #[error("Farm was updated by another request")]
    VersionConflict,

    #[error("Total supply reached for item")]
    SupplyExhausted,

    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Database(ref e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                e.to_string(),
            ),
            AppError::BlockchainRPC(ref msg) => (
                StatusCode::BAD_GATEWAY,
                "BLOCKCHAIN_RPC_ERROR",
                msg.clone(),
            ),
            AppError::Signer(ref msg) => (StatusCode::BAD_GATEWAY, "SIGNER_ERROR", msg.clone()),
            AppError::UnableToVerifyAccount => (
                StatusCode::UNAUTHORIZED,
                "UNABLE_TO_VERIFY_ACCOUNT",
                "Unable to verify account".to_string(),
            ),
            AppError::NotFarmOwner => (
                StatusCode::FORBIDDEN,
                "NOT_FARM_OWNER",
                "You are not the owner of this farm".to_string(),
            ),
            AppError::FarmNotFound => (
                StatusCode::NOT_FOUND,
                "FARM_NOT_FOUND",
                "Farm does not exist".to_string(),
            ),
            AppError::Blacklisted => (
                StatusCode::FORBIDDEN,
                "BLACKLISTED",
                "Farm is blacklisted".to_string(),
            ),
            AppError::SessionMismatch => (
                StatusCode::CONFLICT,
                "SESSION_MISMATCH",
                "Session has changed".to_string(),
            ),
            AppError::VersionConflict => (
                StatusCode::CONFLICT,
                "VERSION_CONFLICT",
                "Farm was updated by another request".to_string(),
            ),
            AppError::SupplyExhausted => (
                StatusCode::BAD_REQUEST,
                "SUPPLY_EXHAUSTED",
                "Total supply reached for item".to_string(),
            ),
            AppError::Rule(ref e) => (StatusCode::BAD_REQUEST, "RULE_VIOLATION", e.to_string()),
            AppError::Replay(ref e) => (StatusCode::BAD_REQUEST, "REPLAY_REJECTED", e.to_string()),
            AppError::Unit(ref e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UNIT_ERROR",
                e.to_string(),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Internal(ref msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
