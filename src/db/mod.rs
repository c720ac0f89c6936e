use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::{
    config::Config,
    error::{AppError, Result},
    game::state::GameState,
    models::FarmRecord,
};

/// Logical contract of the farm-record store. Every write that touches a
/// snapshot carries the version read earlier; a conflicting concurrent
/// write surfaces as `VersionConflict` rather than a silent retry.
#[async_trait]
pub trait FarmStore: Send + Sync {
    async fn get(&self, farm_id: u64) -> Result<Option<FarmRecord>>;

    async fn create(&self, record: &FarmRecord) -> Result<()>;

    async fn update_game_state(
        &self,
        farm_id: u64,
        updated_by: &str,
        state: &GameState,
        flagged_count: i32,
        version: i64,
    ) -> Result<()>;

    async fn update_session(
        &self,
        farm_id: u64,
        updated_by: &str,
        session_id: &str,
        state: &GameState,
        previous: &GameState,
        version: i64,
    ) -> Result<()>;

    async fn blacklist(&self, farm_id: u64, at: DateTime<Utc>) -> Result<()>;

    async fn mark_verified(&self, farm_id: u64, verify_at: DateTime<Utc>) -> Result<()>;
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // migrations harus berada di crate root: ./migrations
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ==================== FARM QUERIES ====================

#[async_trait]
impl FarmStore for Database {
    async fn get(&self, farm_id: u64) -> Result<Option<FarmRecord>> {
        let record = sqlx::query_as::<_, FarmRecord>("SELECT * FROM farms WHERE id = $1")
            .bind(farm_id as i64)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn create(&self, record: &FarmRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO farms
                 (id, owner, updated_by, account, session_id, game_state,
                  previous_game_state, flagged_count, verify_at, version)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(record.id)
        .bind(&record.owner)
        .bind(&record.updated_by)
        .bind(&record.account)
        .bind(&record.session_id)
        .bind(&record.game_state)
        .bind(&record.previous_game_state)
        .bind(record.flagged_count)
        .bind(record.verify_at)
        .bind(record.version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_game_state(
        &self,
        farm_id: u64,
        updated_by: &str,
        state: &GameState,
        flagged_count: i32,
        version: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE farms
             SET game_state = $1,
                 flagged_count = $2,
                 updated_by = $3,
                 version = version + 1,
                 updated_at = NOW()
             WHERE id = $4 AND version = $5",
        )
        .bind(Json(state))
        .bind(flagged_count)
        .bind(updated_by)
        .bind(farm_id as i64)
        .bind(version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::VersionConflict);
        }
        Ok(())
    }

    async fn update_session(
        &self,
        farm_id: u64,
        updated_by: &str,
        session_id: &str,
        state: &GameState,
        previous: &GameState,
        version: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE farms
             SET session_id = $1,
                 game_state = $2,
                 previous_game_state = $3,
                 updated_by = $4,
                 version = version + 1,
                 updated_at = NOW()
             WHERE id = $5 AND version = $6",
        )
        .bind(session_id)
        .bind(Json(state))
        .bind(Json(previous))
        .bind(updated_by)
        .bind(farm_id as i64)
        .bind(version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::VersionConflict);
        }
        Ok(())
    }

    async fn blacklist(&self, farm_id: u64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE farms SET blacklisted_at = $1, updated_at = NOW()
             WHERE id = $2 AND blacklisted_at IS NULL",
        )
        .bind(at)
        .bind(farm_id as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_verified(&self, farm_id: u64, verify_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE farms SET verify_at = $1, updated_at = NOW() WHERE id = $2")
            .bind(verify_at)
            .bind(farm_id as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ==================== IN-MEMORY STORE (tests) ====================

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Test double with the same optimistic-version semantics as the
    /// Postgres store.
    #[derive(Default)]
    pub struct MemoryFarmStore {
        pub farms: Mutex<HashMap<u64, FarmRecord>>,
    }

    impl MemoryFarmStore {
        pub fn with(record: FarmRecord) -> Self {
            let store = Self::default();
            store
                .farms
                .lock()
                .unwrap()
                .insert(record.id as u64, record);
            store
        }
    }

    #[async_trait]
    impl FarmStore for MemoryFarmStore {
        async fn get(&self, farm_id: u64) -> Result<Option<FarmRecord>> {
            Ok(self.farms.lock().unwrap().get(&farm_id).cloned())
        }

        async fn create(&self, record: &FarmRecord) -> Result<()> {
            self.farms
                .lock()
                .unwrap()
                .insert(record.id as u64, record.clone());
            Ok(())
        }

        async fn update_game_state(
            &self,
            farm_id: u64,
            updated_by: &str,
            state: &GameState,
            flagged_count: i32,
            version: i64,
        ) -> Result<()> {
            let mut farms = self.farms.lock().unwrap();
            let record = farms
                .get_mut(&farm_id)
                .filter(|record| record.version == version)
                .ok_or(AppError::VersionConflict)?;
            record.game_state = Json(state.clone());
            record.flagged_count = flagged_count;
            record.updated_by = updated_by.to_string();
            record.version += 1;
            Ok(())
        }

        async fn update_session(
            &self,
            farm_id: u64,
            updated_by: &str,
            session_id: &str,
            state: &GameState,
            previous: &GameState,
            version: i64,
        ) -> Result<()> {
            let mut farms = self.farms.lock().unwrap();
            let record = farms
                .get_mut(&farm_id)
                .filter(|record| record.version == version)
                .ok_or(AppError::VersionConflict)?;
            record.session_id = session_id.to_string();
            record.game_state = Json(state.clone());
            record.previous_game_state = Json(previous.clone());
            record.updated_by = updated_by.to_string();
            record.version += 1;
            Ok(())
        }

        async fn blacklist(&self, farm_id: u64, at: DateTime<Utc>) -> Result<()> {
            if let Some(record) = self.farms.lock().unwrap().get_mut(&farm_id) {
                record.blacklisted_at.get_or_insert(at);
            }
            Ok(())
        }

        async fn mark_verified(&self, farm_id: u64, verify_at: DateTime<Utc>) -> Result<()> {
            if let Some(record) = self.farms.lock().unwrap().get_mut(&farm_id) {
                record.verify_at = verify_at;
            }
            Ok(())
        }
    }
}
