use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::{
    constants::CAPTCHA_PERIOD_SECONDS,
    db::FarmStore,
    error::{AppError, Result},
    game::actions::GameAction,
    game::fraud::{self, FraudGate},
    game::replay,
    game::state::GameState,
    services::captcha::CaptchaVerifier,
};

/// Result of a save attempt. An unsolved or failed CAPTCHA blocks the save
/// without being an error; callers must distinguish the two shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Verified {
        state: GameState,
        flagged_count: i32,
    },
    Unverified,
}

pub struct AutosaveService {
    store: Arc<dyn FarmStore>,
    captcha: Arc<dyn CaptchaVerifier>,
}

impl AutosaveService {
    pub fn new(store: Arc<dyn FarmStore>, captcha: Arc<dyn CaptchaVerifier>) -> Self {
        Self { store, captcha }
    }

    pub async fn save(
        &self,
        farm_id: u64,
        sender: &str,
        actions: &[GameAction],
        captcha_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SaveOutcome> {
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

        match fraud::evaluate(record.flagged_count, record.verify_at, now) {
            FraudGate::Blacklist => {
                tracing::warn!(
                    "Blacklisting farm {} (flagged {})",
                    farm_id,
                    record.flagged_count
                );
                self.store.blacklist(farm_id, now).await?;
                return Err(AppError::Blacklisted);
            }
            FraudGate::CaptchaRequired => {
                let Some(token) = captcha_token else {
                    return Ok(SaveOutcome::Unverified);
                };
                if !self.captcha.verify(token).await? {
                    // Failed challenge: one more flag, save blocked.
                    self.store
                        .update_game_state(
                            farm_id,
                            sender,
                            &record.game_state.0,
                            record.flagged_count + 1,
                            record.version,
                        )
                        .await?;
                    return Ok(SaveOutcome::Unverified);
                }
                self.store
                    .mark_verified(farm_id, now + Duration::seconds(CAPTCHA_PERIOD_SECONDS))
                    .await?;
            }
            FraudGate::Clear => {}
        }

        let replayed = replay::process(&record.game_state.0, actions, now)?;

        // Flags accumulate across saves; a successful save never resets them.
        let flagged_count = record.flagged_count + replayed.flagged_count;
        if fraud::exceeds_blacklist_threshold(flagged_count) {
            tracing::warn!("Blacklisting farm {} (flagged {})", farm_id, flagged_count);
            self.store.blacklist(farm_id, now).await?;
            return Err(AppError::Blacklisted);
        }

        self.store
            .update_game_state(farm_id, sender, &replayed.state, flagged_count, record.version)
            .await?;

        tracing::info!(
            "Saved farm {} ({} actions, {} flags)",
            farm_id,
            actions.len(),
            replayed.flagged_count
        );
        Ok(SaveOutcome::Verified {
            state: replayed.state,
            flagged_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_FLAGGED_ACTIONS;
    use crate::db::memory::MemoryFarmStore;
    use crate::game::items::ItemName;
    use crate::models::FarmRecord;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use sqlx::types::Json;

    const OWNER: &str = "0x1111111111111111111111111111111111111111";

    struct StubCaptcha {
        success: bool,
    }

    #[async_trait]
    impl CaptchaVerifier for StubCaptcha {
        async fn verify(&self, _token: &str) -> crate::error::Result<bool> {
            Ok(self.success)
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn record(flagged_count: i32, verify_at: DateTime<Utc>) -> FarmRecord {
        FarmRecord {
            id: 1,
            owner: OWNER.to_string(),
            updated_by: OWNER.to_string(),
            account: "0x2222222222222222222222222222222222222222".to_string(),
            session_id: "0x00000000000000000000000000000000000000000000000000000000000000aa"
                .to_string(),
            game_state: Json(GameState::initial(1)),
            previous_game_state: Json(GameState::initial(1)),
            flagged_count,
            verify_at,
            blacklisted_at: None,
            version: 1,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn plant(index: u32, secs: i64) -> GameAction {
        GameAction::Planted {
            item: ItemName::SunflowerSeed,
            index,
            created_at: at(secs),
        }
    }

    #[tokio::test]
    async fn save_applies_the_batch_and_persists() {
        let store = Arc::new(MemoryFarmStore::with(record(0, at(10_000))));
        let saves = AutosaveService::new(store.clone(), Arc::new(StubCaptcha { success: true }));

        let outcome = saves
            .save(1, OWNER, &[plant(0, 98), plant(1, 100)], None, at(100))
            .await
            .unwrap();

        let SaveOutcome::Verified { state, flagged_count } = outcome else {
            panic!("expected a verified save");
        };
        assert_eq!(flagged_count, 0);
        assert_eq!(state.fields.len(), 2);

        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(stored.game_state.0, state);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn flags_accumulate_across_saves() {
        let store = Arc::new(MemoryFarmStore::with(record(3, at(10_000))));
        let saves = AutosaveService::new(store.clone(), Arc::new(StubCaptcha { success: true }));

        // two actions 10 ms apart: one burst flag
        let outcome = saves
            .save(
                1,
                OWNER,
                &[
                    GameAction::Planted {
                        item: ItemName::SunflowerSeed,
                        index: 0,
                        created_at: Utc.timestamp_millis_opt(100_000).unwrap(),
                    },
                    GameAction::Planted {
                        item: ItemName::SunflowerSeed,
                        index: 1,
                        created_at: Utc.timestamp_millis_opt(100_010).unwrap(),
                    },
                ],
                None,
                at(100),
            )
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            SaveOutcome::Verified {
                flagged_count: 4,
                ..
            }
        ));
        assert_eq!(store.get(1).await.unwrap().unwrap().flagged_count, 4);
    }

    #[tokio::test]
    async fn save_past_verify_at_without_token_is_unverified() {
        let store = Arc::new(MemoryFarmStore::with(record(0, at(50))));
        let saves = AutosaveService::new(store.clone(), Arc::new(StubCaptcha { success: true }));

        let outcome = saves.save(1, OWNER, &[plant(0, 100)], None, at(100)).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Unverified);
        // nothing was applied
        assert_eq!(store.get(1).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn failed_captcha_blocks_the_save_and_adds_a_flag() {
        let store = Arc::new(MemoryFarmStore::with(record(2, at(50))));
        let saves = AutosaveService::new(store.clone(), Arc::new(StubCaptcha { success: false }));

        let outcome = saves
            .save(1, OWNER, &[plant(0, 100)], Some("token"), at(100))
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Unverified);

        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(stored.flagged_count, 3);
        assert_eq!(stored.game_state.0.fields.len(), 0);
    }

    #[tokio::test]
    async fn solved_captcha_pushes_verify_at_and_applies_the_save() {
        let store = Arc::new(MemoryFarmStore::with(record(0, at(50))));
        let saves = AutosaveService::new(store.clone(), Arc::new(StubCaptcha { success: true }));

        let outcome = saves
            .save(1, OWNER, &[plant(0, 100)], Some("token"), at(100))
            .await
            .unwrap();
        assert!(matches!(outcome, SaveOutcome::Verified { .. }));

        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(
            stored.verify_at,
            at(100) + Duration::seconds(CAPTCHA_PERIOD_SECONDS)
        );
    }

    #[tokio::test]
    async fn crossing_the_flag_threshold_blacklists_the_farm() {
        let store = Arc::new(MemoryFarmStore::with(record(
            MAX_FLAGGED_ACTIONS,
            at(10_000),
        )));
        let saves = AutosaveService::new(store.clone(), Arc::new(StubCaptcha { success: true }));

        // burst batch adds a flag, tipping past the threshold
        let result = saves
            .save(
                1,
                OWNER,
                &[
                    GameAction::Planted {
                        item: ItemName::SunflowerSeed,
                        index: 0,
                        created_at: Utc.timestamp_millis_opt(100_000).unwrap(),
                    },
                    GameAction::Planted {
                        item: ItemName::SunflowerSeed,
                        index: 1,
                        created_at: Utc.timestamp_millis_opt(100_010).unwrap(),
                    },
                ],
                None,
                at(100),
            )
            .await;
        assert!(matches!(result, Err(AppError::Blacklisted)));
        assert!(store.get(1).await.unwrap().unwrap().is_blacklisted());
    }

    #[tokio::test]
    async fn replay_failure_leaves_the_record_untouched() {
        let store = Arc::new(MemoryFarmStore::with(record(0, at(10_000))));
        let saves = AutosaveService::new(store.clone(), Arc::new(StubCaptcha { success: true }));

        let result = saves
            .save(1, OWNER, &[plant(0, 100), plant(0, 101)], None, at(100))
            .await;
        assert!(matches!(result, Err(AppError::Replay(_))));

        let stored = store.get(1).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.game_state.0, GameState::initial(1));
    }

    #[tokio::test]
    async fn save_for_someone_elses_farm_is_rejected() {
        let store = Arc::new(MemoryFarmStore::with(record(0, at(10_000))));
        let saves = AutosaveService::new(store, Arc::new(StubCaptcha { success: true }));

        let result = saves
            .save(
                1,
                "0x9999999999999999999999999999999999999999",
                &[plant(0, 100)],
                None,
                at(100),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFarmOwner)));
    }
}
