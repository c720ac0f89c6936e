use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

use crate::constants::{
    MAX_CLOCK_SKEW_MS, MAX_EVENT_AGE_MS, MAX_SESSION_MS, MILLISECONDS_HUMANLY_POSSIBLE,
};
use crate::game::actions::GameAction;
use crate::game::reducer::{apply, RuleViolation};
use crate::game::state::GameState;

/// Hard rejection of a whole batch. Soft timing anomalies never appear
/// here; they only raise the flag counter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplayError {
    #[error("Events must be in chronological order")]
    OutOfOrder,

    #[error("Event batch spans more than the allowed window")]
    WindowExceeded,

    #[error("Event is in the future")]
    EventInFuture,

    #[error("Event is too old")]
    EventExpired,

    #[error(transparent)]
    Rule(#[from] RuleViolation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Replayed {
    pub state: GameState,
    pub flagged_count: i32,
}

/// Replays a batch of actions against a snapshot. The fold is
/// deterministic: the reducer sees each action's own timestamp, and `now`
/// is used only to bound clock skew and staleness. Any fatal error discards
/// the whole fold.
pub fn process(
    state: &GameState,
    actions: &[GameAction],
    now: DateTime<Utc>,
) -> Result<Replayed, ReplayError> {
    let (Some(first), Some(last)) = (actions.first(), actions.last()) else {
        return Ok(Replayed {
            state: state.clone(),
            flagged_count: 0,
        });
    };

    let mut flagged_count = 0;

    let range_ms = (last.created_at() - first.created_at()).num_milliseconds();
    if range_ms > MAX_SESSION_MS {
        return Err(ReplayError::WindowExceeded);
    }
    if actions.len() > 2 {
        let average_ms = range_ms / actions.len() as i64;
        if average_ms < MILLISECONDS_HUMANLY_POSSIBLE {
            flagged_count += 1;
        }
    }

    let mut current = state.clone();
    let mut previous_at: Option<DateTime<Utc>> = None;
    let mut last_of_kind: HashMap<&'static str, DateTime<Utc>> = HashMap::new();

    for action in actions {
        let at = action.created_at();

        if let Some(previous) = previous_at {
            if at < previous {
                return Err(ReplayError::OutOfOrder);
            }
            if (at - previous).num_milliseconds() < MILLISECONDS_HUMANLY_POSSIBLE {
                flagged_count += 1;
            }
        }

        if let (Some(cooldown_ms), Some(same_kind)) =
            (action.gather_cooldown_ms(), last_of_kind.get(action.kind()))
        {
            if (at - *same_kind).num_milliseconds() < cooldown_ms {
                flagged_count += 1;
            }
        }

        if (at - now).num_milliseconds() > MAX_CLOCK_SKEW_MS {
            return Err(ReplayError::EventInFuture);
        }
        if (now - at).num_milliseconds() > MAX_EVENT_AGE_MS {
            return Err(ReplayError::EventExpired);
        }

        current = apply(&current, action, at)?;
        last_of_kind.insert(action.kind(), at);
        previous_at = Some(at);
    }

    Ok(Replayed {
        state: current,
        flagged_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::items::ItemName;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn plant(index: u32, ms: i64) -> GameAction {
        GameAction::Planted {
            item: ItemName::SunflowerSeed,
            index,
            created_at: at(ms),
        }
    }

    #[test]
    fn empty_batch_returns_the_state_unchanged() {
        let state = GameState::initial(1);
        let replayed = process(&state, &[], at(0)).unwrap();
        assert_eq!(replayed.state, state);
        assert_eq!(replayed.flagged_count, 0);
    }

    #[test]
    fn well_spaced_batch_replays_without_flags() {
        let state = GameState::initial(1);
        let actions = [plant(0, 0), plant(1, 2_000), plant(2, 4_000)];
        let replayed = process(&state, &actions, at(5_000)).unwrap();
        assert_eq!(replayed.flagged_count, 0);
        assert_eq!(replayed.state.fields.len(), 3);
        assert_eq!(
            replayed.state.inventory_amount(ItemName::SunflowerSeed),
            Decimal::from(2)
        );
    }

    #[test]
    fn out_of_order_batch_is_fatal_regardless_of_content() {
        let state = GameState::initial(1);
        let actions = [plant(0, 2_000), plant(1, 1_000)];
        assert_eq!(
            process(&state, &actions, at(3_000)),
            Err(ReplayError::OutOfOrder)
        );
    }

    #[test]
    fn batch_spanning_more_than_two_minutes_is_fatal() {
        let state = GameState::initial(1);
        let actions = [plant(0, 0), plant(1, 121_000)];
        assert_eq!(
            process(&state, &actions, at(121_000)),
            Err(ReplayError::WindowExceeded)
        );
    }

    #[test]
    fn event_far_ahead_of_the_clock_is_fatal() {
        let state = GameState::initial(1);
        let actions = [plant(0, 100_000)];
        assert_eq!(
            process(&state, &actions, at(0)),
            Err(ReplayError::EventInFuture)
        );
    }

    #[test]
    fn stale_event_is_fatal() {
        let state = GameState::initial(1);
        let actions = [plant(0, 0)];
        assert_eq!(
            process(&state, &actions, at(301_000)),
            Err(ReplayError::EventExpired)
        );
    }

    #[test]
    fn inhumanly_fast_pairs_are_flagged_but_not_fatal() {
        let state = GameState::initial(1);
        let actions = [plant(0, 0), plant(1, 10)];
        let replayed = process(&state, &actions, at(1_000)).unwrap();
        assert_eq!(replayed.flagged_count, 1);
        assert_eq!(replayed.state.fields.len(), 2);
    }

    #[test]
    fn inhumanly_fast_average_adds_a_flag() {
        let state = GameState::initial(1);
        let actions = [plant(0, 0), plant(1, 10), plant(2, 20), plant(3, 30)];
        let replayed = process(&state, &actions, at(1_000)).unwrap();
        // one average flag + three per-gap flags
        assert_eq!(replayed.flagged_count, 4);
    }

    #[test]
    fn rapid_same_kind_gathering_is_flagged() {
        let mut state = GameState::initial(1);
        state.set_inventory(ItemName::Axe, Decimal::from(2));
        let actions = [
            GameAction::TreeChopped {
                index: 0,
                created_at: at(10_000_000),
            },
            GameAction::TreeChopped {
                index: 1,
                created_at: at(10_000_500),
            },
        ];
        let replayed = process(&state, &actions, at(10_001_000)).unwrap();
        // cadence flag only: the 500 ms gap is above the human floor
        assert_eq!(replayed.flagged_count, 1);
        assert_eq!(
            replayed.state.inventory_amount(ItemName::Wood),
            Decimal::from(6)
        );
    }

    #[test]
    fn rule_violation_mid_batch_discards_the_whole_fold() {
        let state = GameState::initial(1);
        // second action plants the same plot again
        let actions = [plant(0, 0), plant(0, 2_000)];
        assert_eq!(
            process(&state, &actions, at(3_000)),
            Err(ReplayError::Rule(RuleViolation::FieldOccupied))
        );
    }

    #[test]
    fn replay_is_deterministic() {
        let state = GameState::initial(1);
        let actions = [plant(0, 0), plant(1, 10), plant(2, 2_000)];
        let first = process(&state, &actions, at(3_000)).unwrap();
        let second = process(&state, &actions, at(3_000)).unwrap();
        assert_eq!(first, second);
    }
}
