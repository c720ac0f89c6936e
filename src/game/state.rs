use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    BASE_FIELD_COUNT, LEVEL_EXPERIENCE, MAX_FIELD_COUNT, TIER_THREE_FIELD_COUNT,
    TIER_TWO_FIELD_COUNT,
};
use crate::game::items::{initial_stock, ItemName, Profession};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantedCrop {
    pub name: ItemName,
    pub planted_at: DateTime<Utc>,
}

/// A gatherable resource node. `gathered_at` is the last time the node was
/// emptied; it replenishes after the per-resource recovery window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    pub amount: Decimal,
    pub gathered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillExperience {
    pub farming: Decimal,
    pub gathering: Decimal,
}

/// The cached snapshot of one farm. Absent inventory keys mean zero; no
/// quantity in `inventory`, `stock` or `balance` is ever negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub id: u64,
    pub balance: Decimal,
    #[serde(default)]
    pub inventory: BTreeMap<ItemName, Decimal>,
    #[serde(default)]
    pub fields: BTreeMap<u32, PlantedCrop>,
    #[serde(default)]
    pub trees: BTreeMap<u32, ResourceNode>,
    #[serde(default)]
    pub stones: BTreeMap<u32, ResourceNode>,
    #[serde(default)]
    pub iron: BTreeMap<u32, ResourceNode>,
    #[serde(default)]
    pub gold: BTreeMap<u32, ResourceNode>,
    #[serde(default)]
    pub stock: BTreeMap<ItemName, Decimal>,
    #[serde(default)]
    pub skills: SkillExperience,
}

impl GameState {
    /// The static defaults every farm starts from. Node timestamps sit at
    /// the epoch so everything is gatherable in the first session.
    pub fn initial(id: u64) -> GameState {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        let node = |amount: i64| ResourceNode {
            amount: Decimal::from(amount),
            gathered_at: epoch,
        };

        GameState {
            id,
            balance: Decimal::ZERO,
            inventory: BTreeMap::from([
                (ItemName::SunflowerSeed, Decimal::from(5)),
                (ItemName::Axe, Decimal::from(1)),
            ]),
            fields: BTreeMap::new(),
            trees: (0..5).map(|i| (i, node(3))).collect(),
            stones: (0..3).map(|i| (i, node(2))).collect(),
            iron: (0..2).map(|i| (i, node(2))).collect(),
            gold: BTreeMap::from([(0, node(2))]),
            stock: initial_stock(),
            skills: SkillExperience::default(),
        }
    }

    pub fn inventory_amount(&self, item: ItemName) -> Decimal {
        self.inventory.get(&item).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn stock_amount(&self, item: ItemName) -> Option<Decimal> {
        self.stock.get(&item).copied()
    }

    /// True when at least one unit of the item is held; used for land-tier
    /// gates and skill flags.
    pub fn has(&self, item: ItemName) -> bool {
        self.inventory_amount(item) >= Decimal::ONE
    }

    /// Writes an inventory quantity, dropping the key at zero so that
    /// "absent means zero" stays canonical.
    pub fn set_inventory(&mut self, item: ItemName, amount: Decimal) {
        if amount.is_zero() {
            self.inventory.remove(&item);
        } else {
            self.inventory.insert(item, amount);
        }
    }

    /// Number of plots unlocked by the held land-tier items.
    pub fn field_limit(&self) -> u32 {
        if self.has(ItemName::RoastedCauliflower) {
            MAX_FIELD_COUNT
        } else if self.has(ItemName::Sauerkraut) {
            TIER_THREE_FIELD_COUNT
        } else if self.has(ItemName::PumpkinSoup) {
            TIER_TWO_FIELD_COUNT
        } else {
            BASE_FIELD_COUNT
        }
    }

    /// Profession level derived from accumulated experience via the step
    /// function in `LEVEL_EXPERIENCE`.
    pub fn level_of(&self, profession: Profession) -> u8 {
        let experience = match profession {
            Profession::Farming => self.skills.farming,
            Profession::Gathering => self.skills.gathering,
        };
        let mut level = 1;
        for (index, threshold) in LEVEL_EXPERIENCE.iter().enumerate() {
            if experience >= Decimal::from(*threshold) {
                level = index as u8 + 1;
            }
        }
        level
    }
}
