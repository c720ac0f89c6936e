use chrono::{DateTime, Duration, Utc};
use ethers::types::U256;
use ethers::utils::to_checksum;
use sqlx::types::Json;
use std::sync::Arc;

use crate::{
    constants::CAPTCHA_PERIOD_SECONDS,
    db::FarmStore,
    error::{AppError, Result},
    game::items::{initial_stock, ALL_ITEMS},
    game::state::GameState,
    game::units::{from_chain_integer, Unit},
    models::FarmRecord,
    services::chain::{parse_address, ChainReader},
    services::migration::MigrationSource,
};

/// Decides whether a cached session is fresh, stale or missing relative to
/// the caller-supplied on-chain session id, and bootstraps or resyncs
/// accordingly. The chain is treated as correct once a session rolls over:
/// any unsettled off-chain delta is discarded on resync.
pub struct SessionService {
    store: Arc<dyn FarmStore>,
    chain: Arc<dyn ChainReader>,
    migrations: Arc<dyn MigrationSource>,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn FarmStore>,
        chain: Arc<dyn ChainReader>,
        migrations: Arc<dyn MigrationSource>,
    ) -> Self {
        Self {
            store,
            chain,
            migrations,
        }
    }

    pub async fn start(
        &self,
        farm_id: u64,
        sender: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<GameState> {
        let Some(record) = self.store.get(farm_id).await? else {
            return self.bootstrap(farm_id, sender, session_id, now).await;
        };

        if record.is_blacklisted() {
            return Err(AppError::Blacklisted);
        }
        if !record.owned_by(sender) {
            return Err(AppError::NotFarmOwner);
        }

        if record.session_id == session_id {
            // Fresh cache; no chain read needed.
            return Ok(record.game_state.0.clone());
        }

        tracing::info!(
            "Session rolled over for farm {} ({} -> {})",
            farm_id,
            record.session_id,
            session_id
        );
        self.resync(record, session_id).await
    }

    /// First-ever session for this farm id: verify ownership on-chain,
    /// start from static defaults and merge the one-time legacy snapshot.
    /// The baseline stays the unmigrated defaults so the first settlement
    /// changeset mints exactly the migration credit.
    async fn bootstrap(
        &self,
        farm_id: u64,
        sender: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<GameState> {
        let owner = self.chain.owner_of(farm_id).await?;
        let owner = to_checksum(&owner, None);
        if !owner.eq_ignore_ascii_case(sender) {
            return Err(AppError::NotFarmOwner);
        }
        let account = self.chain.account_of(farm_id).await?;

        let baseline = GameState::initial(farm_id);
        let mut state = baseline.clone();
        if let Some(snapshot) = self.migrations.snapshot_for(&owner).await? {
            tracing::info!("Applying legacy snapshot for farm {}", farm_id);
            state.balance += snapshot.balance;
            for (item, amount) in snapshot.inventory {
                let total = state.inventory_amount(item) + amount;
                state.set_inventory(item, total);
            }
        }

        let record = FarmRecord {
            id: farm_id as i64,
            owner: owner.clone(),
            updated_by: owner.clone(),
            account: to_checksum(&account, None),
            session_id: session_id.to_string(),
            game_state: Json(state.clone()),
            previous_game_state: Json(baseline),
            flagged_count: 0,
            verify_at: now + Duration::seconds(CAPTCHA_PERIOD_SECONDS),
            blacklisted_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.store.create(&record).await?;

        tracing::info!("Bootstrapped farm {} for {}", farm_id, owner);
        Ok(state)
    }

    /// The stored session id lags the chain: re-read authoritative balances,
    /// reset the ephemeral stock and close out the old baseline.
    async fn resync(&self, record: FarmRecord, session_id: &str) -> Result<GameState> {
        let account = parse_address(&record.account)?;
        let ids: Vec<U256> = ALL_ITEMS
            .iter()
            .map(|item| U256::from(item.token_id()))
            .collect();

        let raw_balance = self.chain.balance_of(account).await?;
        let raw_inventory = self.chain.inventory_of(account, &ids).await?;
        if raw_inventory.len() != ALL_ITEMS.len() {
            return Err(AppError::BlockchainRPC(
                "inventory batch length mismatch".to_string(),
            ));
        }

        let mut refreshed = record.game_state.0.clone();
        refreshed.balance = from_chain_integer(raw_balance, Unit::Fixed18)?;
        refreshed.inventory.clear();
        for (item, raw) in ALL_ITEMS.iter().zip(raw_inventory) {
            if raw.is_zero() {
                continue;
            }
            refreshed
                .inventory
                .insert(*item, from_chain_integer(raw, item.unit())?);
        }
        refreshed.stock = initial_stock();

        // New baseline equals the refreshed state.
        let previous = refreshed.clone();
        self.store
            .update_session(
                record.id as u64,
                &record.owner,
                session_id,
                &refreshed,
                &previous,
                record.version,
            )
            .await?;

        Ok(refreshed)
    }
}
