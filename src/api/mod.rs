// src/api/mod.rs

pub mod autosave;
pub mod health;
pub mod session;
pub mod settlement;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::crypto::signature::verify_account;
use crate::error::Result;
use crate::services::{
    autosave::AutosaveService, session::SessionService, settlement::SettlementService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionService>,
    pub autosave: Arc<AutosaveService>,
    pub settlement: Arc<SettlementService>,
}

/// Every operation authenticates the same way: the caller signs the daily
/// login message and we recover the address from the signature.
pub fn require_signed_sender(
    sender: &str,
    signature: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    verify_account(sender, signature, now)?;
    Ok(())
}
