use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::GATHER_COOLDOWN_MS;
use crate::game::items::ItemName;

fn default_amount() -> u32 {
    1
}

/// Player actions, submitted in batches and replayed server-side. A closed
/// sum type: an unknown `type` tag fails deserialization outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameAction {
    #[serde(rename = "item.planted")]
    Planted {
        item: ItemName,
        index: u32,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "item.harvested")]
    Harvested {
        index: u32,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "item.crafted")]
    Crafted {
        item: ItemName,
        #[serde(default = "default_amount")]
        amount: u32,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "item.sold")]
    Sold {
        item: ItemName,
        #[serde(default = "default_amount")]
        amount: u32,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "tree.chopped")]
    TreeChopped {
        index: u32,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "stone.mined")]
    StoneMined {
        index: u32,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "iron.mined")]
    IronMined {
        index: u32,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "gold.mined")]
    GoldMined {
        index: u32,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "skill.learned")]
    SkillLearned {
        skill: ItemName,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
    },
}

impl GameAction {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            GameAction::Planted { created_at, .. }
            | GameAction::Harvested { created_at, .. }
            | GameAction::Crafted { created_at, .. }
            | GameAction::Sold { created_at, .. }
            | GameAction::TreeChopped { created_at, .. }
            | GameAction::StoneMined { created_at, .. }
            | GameAction::IronMined { created_at, .. }
            | GameAction::GoldMined { created_at, .. }
            | GameAction::SkillLearned { created_at, .. } => *created_at,
        }
    }

    /// The wire tag; doubles as the cadence key for same-kind timing checks.
    pub fn kind(&self) -> &'static str {
        match self {
            GameAction::Planted { .. } => "item.planted",
            GameAction::Harvested { .. } => "item.harvested",
            GameAction::Crafted { .. } => "item.crafted",
            GameAction::Sold { .. } => "item.sold",
            GameAction::TreeChopped { .. } => "tree.chopped",
            GameAction::StoneMined { .. } => "stone.mined",
            GameAction::IronMined { .. } => "iron.mined",
            GameAction::GoldMined { .. } => "gold.mined",
            GameAction::SkillLearned { .. } => "skill.learned",
        }
    }

    /// Resource-gathering actions carry a minimum same-kind cadence; firing
    /// faster than this flags the batch as suspicious.
    pub fn gather_cooldown_ms(&self) -> Option<i64> {
        match self {
            GameAction::TreeChopped { .. }
            | GameAction::StoneMined { .. }
            | GameAction::IronMined { .. }
            | GameAction::GoldMined { .. } => Some(GATHER_COOLDOWN_MS),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let raw = r#"{
            "type": "item.planted",
            "item": "Sunflower Seed",
            "index": 2,
            "createdAt": "2022-03-21T09:00:00Z"
        }"#;
        let action: GameAction = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            action,
            GameAction::Planted {
                item: ItemName::SunflowerSeed,
                index: 2,
                ..
            }
        ));
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        let raw = r#"{ "type": "item.duplicated", "createdAt": "2022-03-21T09:00:00Z" }"#;
        let parsed: Result<GameAction, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn craft_amount_defaults_to_one() {
        let raw = r#"{
            "type": "item.crafted",
            "item": "Axe",
            "createdAt": "2022-03-21T09:00:00Z"
        }"#;
        let action: GameAction = serde_json::from_str(raw).unwrap();
        assert!(matches!(action, GameAction::Crafted { amount: 1, .. }));
    }

    #[test]
    fn only_gathering_actions_have_a_cooldown() {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        let chop = GameAction::TreeChopped {
            index: 0,
            created_at: at,
        };
        let harvest = GameAction::Harvested {
            index: 0,
            created_at: at,
        };
        assert_eq!(chop.gather_cooldown_ms(), Some(GATHER_COOLDOWN_MS));
        assert_eq!(harvest.gather_cooldown_ms(), None);
    }
}
