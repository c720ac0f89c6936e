use chrono::{DateTime, Duration, Utc};
use ethers::types::U256;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    constants::{SETTLEMENT_DEADLINE_SECONDS, WITHDRAW_TAX_FLOOR_BPS, WITHDRAW_TAX_TIERS},
    crypto::hash::{sync_digest, withdraw_digest},
    db::FarmStore,
    error::{AppError, Result},
    game::changeset::{diff, SettlementAmounts},
    game::items::{ItemKind, ItemName, LIMITED_ITEMS},
    game::reducer::{craft_collectible, RuleViolation},
    game::units::to_chain_integer,
    models::FarmRecord,
    services::chain::{parse_address, parse_session_id, ChainReader},
    services::signer::SettlementSigner,
};

/// A signed sync/mint payload, ready for the caller to submit on-chain.
/// All integers travel as decimal strings; the signature covers the
/// canonical abi encoding of exactly these fields.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignedSettlement {
    pub session_id: String,
    pub deadline: u64,
    pub sender: String,
    pub farm_id: u64,
    pub mint_ids: Vec<String>,
    pub mint_amounts: Vec<String>,
    pub burn_ids: Vec<String>,
    pub burn_amounts: Vec<String>,
    pub tokens: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignedWithdrawal {
    pub session_id: String,
    pub deadline: u64,
    pub sender: String,
    pub farm_id: u64,
    pub ids: Vec<String>,
    pub amounts: Vec<String>,
    pub sfl: String,
    pub tax: u32,
    pub signature: String,
}

pub struct SettlementService {
    store: Arc<dyn FarmStore>,
    chain: Arc<dyn ChainReader>,
    signer: Arc<dyn SettlementSigner>,
}

impl SettlementService {
    pub fn new(
        store: Arc<dyn FarmStore>,
        chain: Arc<dyn ChainReader>,
        signer: Arc<dyn SettlementSigner>,
    ) -> Self {
        Self {
            store,
            chain,
            signer,
        }
    }

    /// Signs the delta between the cached state and the session baseline.
    pub async fn sync(
        &self,
        farm_id: u64,
        sender: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedSettlement> {
        let record = self.load_checked(farm_id, sender, session_id).await?;

        let changeset = diff(&record.game_state.0, &record.previous_game_state.0)?;
        let amounts = changeset.settlement_amounts();

        self.sign_settlement(&record, sender, amounts, now).await
    }

    /// Crafts exactly one limited collectible against its on-chain supply
    /// and signs the resulting delta from the session baseline.
    pub async fn mint(
        &self,
        farm_id: u64,
        sender: &str,
        session_id: &str,
        item: ItemName,
        now: DateTime<Utc>,
    ) -> Result<SignedSettlement> {
        let record = self.load_checked(farm_id, sender, session_id).await?;

        if !LIMITED_ITEMS.contains(&item) {
            return Err(AppError::Rule(RuleViolation::NotCraftable));
        }
        let remaining = self
            .chain
            .remaining_supply(U256::from(item.token_id()))
            .await?;
        if remaining.is_zero() {
            return Err(AppError::SupplyExhausted);
        }

        let next = craft_collectible(&record.game_state.0, item, now)?;
        self.store
            .update_game_state(farm_id, sender, &next, record.flagged_count, record.version)
            .await?;

        tracing::info!("Farm {} minted {}", farm_id, item);
        let changeset = diff(&next, &record.previous_game_state.0)?;
        self.sign_settlement(&record, sender, changeset.settlement_amounts(), now)
            .await
    }

    /// Signs a withdrawal of items and SFL out of the farm's settlement
    /// account; the tax rate comes from the amount-tiered table.
    pub async fn withdraw(
        &self,
        farm_id: u64,
        sender: &str,
        session_id: &str,
        items: &[(ItemName, Decimal)],
        sfl: Decimal,
        now: DateTime<Utc>,
    ) -> Result<SignedWithdrawal> {
        let record = self.load_checked(farm_id, sender, session_id).await?;

        if sfl.is_sign_negative() {
            return Err(AppError::BadRequest("Negative SFL amount".to_string()));
        }
        if record.game_state.0.balance < sfl {
            return Err(AppError::Rule(RuleViolation::InsufficientFunds));
        }

        let mut ids = Vec::with_capacity(items.len());
        let mut amounts = Vec::with_capacity(items.len());
        for (item, amount) in items {
            if amount.is_zero() || amount.is_sign_negative() {
                return Err(AppError::Rule(RuleViolation::InvalidAmount));
            }
            if item.kind() == ItemKind::Skill {
                return Err(AppError::BadRequest(format!(
                    "{item} cannot be withdrawn"
                )));
            }
            if record.game_state.0.inventory_amount(*item) < *amount {
                return Err(AppError::Rule(RuleViolation::MissingItem(*item)));
            }
            ids.push(U256::from(item.token_id()));
            amounts.push(to_chain_integer(amount, item.unit())?);
        }

        let session = parse_session_id(&record.session_id)?;
        let sender_address = parse_address(sender)?;
        let deadline = deadline_from(now);
        let sfl_raw = to_chain_integer(&sfl, crate::game::units::Unit::Fixed18)?;
        let tax = withdraw_tax_bps(&sfl);

        let digest = withdraw_digest(
            session,
            U256::from(deadline),
            sender_address,
            U256::from(farm_id),
            &ids,
            &amounts,
            sfl_raw,
            U256::from(tax),
        );
        let signature = self.signer.sign(digest).await?;

        Ok(SignedWithdrawal {
            session_id: record.session_id.clone(),
            deadline,
            sender: sender.to_string(),
            farm_id,
            ids: ids.iter().map(U256::to_string).collect(),
            amounts: amounts.iter().map(U256::to_string).collect(),
            sfl: sfl_raw.to_string(),
            tax,
            signature,
        })
    }

    async fn load_checked(
        &self,
        farm_id: u64,
        sender: &str,
        session_id: &str,
    ) -> Result<FarmRecord> {
        let record = self
            .store
            .get(farm_id)
            .await?
            .ok_or(AppError::FarmNotFound)?;

        if record.is_blacklisted() {
            return Err(AppError::Blacklisted);
        }
        if !record.owned_by(sender) {
            return Err(AppError::NotFarmOwner);
        }
        // Stale-replay guard: the id must match the cached session exactly.
        if record.session_id != session_id {
            return Err(AppError::SessionMismatch);
        }
        Ok(record)
    }

    async fn sign_settlement(
        &self,
        record: &FarmRecord,
        sender: &str,
        amounts: SettlementAmounts,
        now: DateTime<Utc>,
    ) -> Result<SignedSettlement> {
        let session = parse_session_id(&record.session_id)?;
        let sender_address = parse_address(sender)?;
        let farm_id = record.id as u64;
        let deadline = deadline_from(now);

        let digest = sync_digest(
            session,
            U256::from(deadline),
            sender_address,
            U256::from(farm_id),
            &amounts,
        );
        let signature = self.signer.sign(digest).await?;

        Ok(SignedSettlement {
            session_id: record.session_id.clone(),
            deadline,
            sender: sender.to_string(),
            farm_id,
            mint_ids: amounts.mint_ids.iter().map(U256::to_string).collect(),
            mint_amounts: amounts.mint_amounts.iter().map(U256::to_string).collect(),
            burn_ids: amounts.burn_ids.iter().map(U256::to_string).collect(),
            burn_amounts: amounts.burn_amounts.iter().map(U256::to_string).collect(),
            tokens: amounts.tokens.to_string(),
            signature,
        })
    }
}

fn deadline_from(now: DateTime<Utc>) -> u64 {
    (now + Duration::seconds(SETTLEMENT_DEADLINE_SECONDS)).timestamp() as u64
}

/// Tax rate in basis points, tiered by the requested SFL amount.
pub fn withdraw_tax_bps(sfl: &Decimal) -> u32 {
    for (limit, bps) in WITHDRAW_TAX_TIERS {
        if *sfl < Decimal::from(limit) {
            return bps;
        }
    }
    WITHDRAW_TAX_FLOOR_BPS
}
