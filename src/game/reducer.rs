use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::constants::{
    GOLD_RECOVERY_SECONDS, IRON_RECOVERY_SECONDS, STONE_RECOVERY_SECONDS, TREE_RECOVERY_SECONDS,
};
use crate::game::actions::GameAction;
use crate::game::items::{recipe_of, skill_requirement, ItemKind, ItemName};
use crate::game::state::{GameState, PlantedCrop};

// Gathering experience per swing
const WOOD_EXPERIENCE: i64 = 1;
const STONE_EXPERIENCE: i64 = 2;
const IRON_EXPERIENCE: i64 = 3;
const GOLD_EXPERIENCE: i64 = 5;

/// Precondition failure of a single state transition. Always fatal for the
/// whole batch; never a soft flag.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleViolation {
    #[error("Field is out of bounds")]
    FieldOutOfRange,

    #[error("Field is already planted")]
    FieldOccupied,

    #[error("Nothing was planted")]
    NothingPlanted,

    #[error("The crop is not ready")]
    CropNotReady,

    #[error("Not a seed")]
    NotASeed,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Missing {0}")]
    MissingItem(ItemName),

    #[error("Item is not craftable")]
    NotCraftable,

    #[error("Item is out of stock")]
    OutOfStock,

    #[error("Item is not for sale")]
    NotForSale,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Node is out of bounds")]
    NodeOutOfRange,

    #[error("The node has not replenished")]
    NodeNotRecovered,

    #[error("Not a skill")]
    NotASkill,

    #[error("Profession level {0} required")]
    LevelRequired(u8),

    #[error("Skill path already chosen")]
    SkillAlreadyChosen,

    #[error("Requires {0}")]
    MissingPrerequisite(ItemName),
}

#[derive(Debug, Clone, Copy)]
enum ResourceKind {
    Tree,
    Stone,
    Iron,
    Gold,
}

/// Applies one action to a snapshot, producing the next snapshot. Pure and
/// total over well-formed input; `now` is the only time source.
pub fn apply(
    state: &GameState,
    action: &GameAction,
    now: DateTime<Utc>,
) -> Result<GameState, RuleViolation> {
    let mut next = state.clone();
    match action {
        GameAction::Planted { item, index, .. } => plant(&mut next, *item, *index, now)?,
        GameAction::Harvested { index, .. } => harvest(&mut next, *index, now)?,
        GameAction::Crafted { item, amount, .. } => craft(&mut next, *item, *amount)?,
        GameAction::Sold { item, amount, .. } => sell(&mut next, *item, *amount)?,
        GameAction::TreeChopped { index, .. } => gather(&mut next, ResourceKind::Tree, *index, now)?,
        GameAction::StoneMined { index, .. } => gather(&mut next, ResourceKind::Stone, *index, now)?,
        GameAction::IronMined { index, .. } => gather(&mut next, ResourceKind::Iron, *index, now)?,
        GameAction::GoldMined { index, .. } => gather(&mut next, ResourceKind::Gold, *index, now)?,
        GameAction::SkillLearned { skill, .. } => learn_skill(&mut next, *skill)?,
    }
    Ok(next)
}

fn plant(
    state: &mut GameState,
    seed: ItemName,
    index: u32,
    now: DateTime<Utc>,
) -> Result<(), RuleViolation> {
    let crop = seed.seed_yields().ok_or(RuleViolation::NotASeed)?;
    if index >= state.field_limit() {
        return Err(RuleViolation::FieldOutOfRange);
    }
    if state.fields.contains_key(&index) {
        return Err(RuleViolation::FieldOccupied);
    }
    take_from_inventory(state, seed, Decimal::ONE)?;
    state.fields.insert(
        index,
        PlantedCrop {
            name: crop,
            planted_at: now,
        },
    );
    Ok(())
}

fn harvest(state: &mut GameState, index: u32, now: DateTime<Utc>) -> Result<(), RuleViolation> {
    if index >= state.field_limit() {
        return Err(RuleViolation::FieldOutOfRange);
    }
    let planted = state
        .fields
        .get(&index)
        .cloned()
        .ok_or(RuleViolation::NothingPlanted)?;
    let details = planted
        .name
        .crop_details()
        .ok_or(RuleViolation::NothingPlanted)?;
    if (now - planted.planted_at).num_seconds() < details.harvest_seconds {
        return Err(RuleViolation::CropNotReady);
    }

    state.fields.remove(&index);
    add_to_inventory(state, planted.name, Decimal::ONE);
    state.skills.farming += Decimal::from(details.experience);
    Ok(())
}

fn craft(state: &mut GameState, item: ItemName, amount: u32) -> Result<(), RuleViolation> {
    if amount == 0 {
        return Err(RuleViolation::InvalidAmount);
    }
    // Limited collectibles only mint through the supply-checked path.
    if item.kind() == ItemKind::Collectible {
        return Err(RuleViolation::NotCraftable);
    }
    let recipe = recipe_of(item).ok_or(RuleViolation::NotCraftable)?;
    let quantity = Decimal::from(amount);

    if let Some(remaining) = state.stock_amount(item) {
        if remaining < quantity {
            return Err(RuleViolation::OutOfStock);
        }
        state.stock.insert(item, remaining - quantity);
    }

    spend_balance(state, recipe.token_amount * quantity)?;
    for (ingredient, required) in &recipe.ingredients {
        take_from_inventory(state, *ingredient, *required * quantity)?;
    }
    add_to_inventory(state, item, quantity);
    Ok(())
}

/// The mint path's crafting transition: same recipe table, but only for
/// limited collectibles and without the session stock gate (supply lives
/// on-chain).
pub fn craft_collectible(
    state: &GameState,
    item: ItemName,
    _now: DateTime<Utc>,
) -> Result<GameState, RuleViolation> {
    if item.kind() != ItemKind::Collectible {
        return Err(RuleViolation::NotCraftable);
    }
    let recipe = recipe_of(item).ok_or(RuleViolation::NotCraftable)?;

    let mut next = state.clone();
    spend_balance(&mut next, recipe.token_amount)?;
    for (ingredient, required) in &recipe.ingredients {
        take_from_inventory(&mut next, *ingredient, *required)?;
    }
    add_to_inventory(&mut next, item, Decimal::ONE);
    Ok(next)
}

fn sell(state: &mut GameState, item: ItemName, amount: u32) -> Result<(), RuleViolation> {
    if amount == 0 {
        return Err(RuleViolation::InvalidAmount);
    }
    let details = item.crop_details().ok_or(RuleViolation::NotForSale)?;
    let quantity = Decimal::from(amount);
    take_from_inventory(state, item, quantity)?;
    state.balance += details.sell_price * quantity;
    Ok(())
}

fn gather(
    state: &mut GameState,
    kind: ResourceKind,
    index: u32,
    now: DateTime<Utc>,
) -> Result<(), RuleViolation> {
    let (tool, recovery_seconds, yields, experience) = match kind {
        ResourceKind::Tree => (ItemName::Axe, TREE_RECOVERY_SECONDS, ItemName::Wood, WOOD_EXPERIENCE),
        ResourceKind::Stone => (
            ItemName::Pickaxe,
            STONE_RECOVERY_SECONDS,
            ItemName::Stone,
            STONE_EXPERIENCE,
        ),
        ResourceKind::Iron => (
            ItemName::StonePickaxe,
            IRON_RECOVERY_SECONDS,
            ItemName::Iron,
            IRON_EXPERIENCE,
        ),
        ResourceKind::Gold => (
            ItemName::IronPickaxe,
            GOLD_RECOVERY_SECONDS,
            ItemName::Gold,
            GOLD_EXPERIENCE,
        ),
    };

    let node = match kind {
        ResourceKind::Tree => state.trees.get(&index),
        ResourceKind::Stone => state.stones.get(&index),
        ResourceKind::Iron => state.iron.get(&index),
        ResourceKind::Gold => state.gold.get(&index),
    }
    .cloned()
    .ok_or(RuleViolation::NodeOutOfRange)?;

    if (now - node.gathered_at).num_seconds() < recovery_seconds {
        return Err(RuleViolation::NodeNotRecovered);
    }

    take_from_inventory(state, tool, Decimal::ONE)?;
    add_to_inventory(state, yields, node.amount);
    state.skills.gathering += Decimal::from(experience);

    let nodes = match kind {
        ResourceKind::Tree => &mut state.trees,
        ResourceKind::Stone => &mut state.stones,
        ResourceKind::Iron => &mut state.iron,
        ResourceKind::Gold => &mut state.gold,
    };
    if let Some(entry) = nodes.get_mut(&index) {
        entry.gathered_at = now;
    }
    Ok(())
}

fn learn_skill(state: &mut GameState, skill: ItemName) -> Result<(), RuleViolation> {
    let requirement = skill_requirement(skill).ok_or(RuleViolation::NotASkill)?;
    if state.level_of(requirement.profession) < requirement.level {
        return Err(RuleViolation::LevelRequired(requirement.level));
    }
    if state.has(skill) || state.has(requirement.sibling) {
        return Err(RuleViolation::SkillAlreadyChosen);
    }
    if let Some(prerequisite) = requirement.prerequisite {
        if !state.has(prerequisite) {
            return Err(RuleViolation::MissingPrerequisite(prerequisite));
        }
    }
    add_to_inventory(state, skill, Decimal::ONE);
    Ok(())
}

fn add_to_inventory(state: &mut GameState, item: ItemName, amount: Decimal) {
    let total = state.inventory_amount(item) + amount;
    state.set_inventory(item, total);
}

fn take_from_inventory(
    state: &mut GameState,
    item: ItemName,
    amount: Decimal,
) -> Result<(), RuleViolation> {
    let held = state.inventory_amount(item);
    if held < amount {
        return Err(RuleViolation::MissingItem(item));
    }
    state.set_inventory(item, held - amount);
    Ok(())
}

fn spend_balance(state: &mut GameState, amount: Decimal) -> Result<(), RuleViolation> {
    if state.balance < amount {
        return Err(RuleViolation::InsufficientFunds);
    }
    state.balance -= amount;
    Ok(())
}
