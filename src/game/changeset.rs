use ethers::types::{Sign, I256, U256};
use std::collections::{BTreeMap, BTreeSet};

use crate::game::items::ItemName;
use crate::game::state::GameState;
use crate::game::units::{to_signed_chain_integer, Unit, UnitError};

/// The exact delta between two snapshots, already expressed in on-chain
/// integer units. Purely computed; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    /// Signed token delta in 18-decimal fixed point; negative means net burn.
    pub balance: I256,
    /// Signed per-item deltas; zero deltas are omitted entirely.
    pub inventory: BTreeMap<ItemName, I256>,
}

/// Mint/burn instruction lists in the order the settlement contract will
/// see them. Derived from a [`Changeset`]; iteration over the BTreeMap
/// keeps the layout canonical for hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementAmounts {
    pub mint_ids: Vec<U256>,
    pub mint_amounts: Vec<U256>,
    pub burn_ids: Vec<U256>,
    pub burn_amounts: Vec<U256>,
    pub tokens: I256,
}

/// Computes `current − previous`, applying each item's unit conversion.
pub fn diff(current: &GameState, previous: &GameState) -> Result<Changeset, UnitError> {
    let balance = to_signed_chain_integer(&(current.balance - previous.balance), Unit::Fixed18)?;

    let names: BTreeSet<ItemName> = current
        .inventory
        .keys()
        .chain(previous.inventory.keys())
        .copied()
        .collect();

    let mut inventory = BTreeMap::new();
    for name in names {
        let delta = current.inventory_amount(name) - previous.inventory_amount(name);
        if delta.is_zero() {
            continue;
        }
        inventory.insert(name, to_signed_chain_integer(&delta, name.unit())?);
    }

    Ok(Changeset { balance, inventory })
}

impl Changeset {
    pub fn settlement_amounts(&self) -> SettlementAmounts {
        let mut amounts = SettlementAmounts {
            mint_ids: Vec::new(),
            mint_amounts: Vec::new(),
            burn_ids: Vec::new(),
            burn_amounts: Vec::new(),
            tokens: self.balance,
        };

        for (item, delta) in &self.inventory {
            let id = U256::from(item.token_id());
            let (sign, magnitude) = delta.into_sign_and_abs();
            match sign {
                Sign::Positive => {
                    amounts.mint_ids.push(id);
                    amounts.mint_amounts.push(magnitude);
                }
                Sign::Negative => {
                    amounts.burn_ids.push(id);
                    amounts.burn_amounts.push(magnitude);
                }
            }
        }

        amounts
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.inventory.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn snapshot(balance: Decimal, items: &[(ItemName, i64)]) -> GameState {
        let mut state = GameState::initial(1);
        state.inventory.clear();
        state.balance = balance;
        for (item, amount) in items {
            state.set_inventory(*item, Decimal::from(*amount));
        }
        state
    }

    #[test]
    fn diff_of_identical_snapshots_is_empty() {
        let state = snapshot(Decimal::from(20), &[(ItemName::Sunflower, 3)]);
        let changeset = diff(&state, &state).unwrap();
        assert!(changeset.is_empty());
        assert!(changeset.inventory.is_empty());
    }

    #[test]
    fn positive_and_negative_deltas_split_into_mint_and_burn() {
        let previous = snapshot(
            Decimal::from(10),
            &[(ItemName::Sunflower, 5), (ItemName::Wood, 4)],
        );
        let current = snapshot(
            Decimal::from(12),
            &[(ItemName::Sunflower, 8), (ItemName::Wood, 1)],
        );

        let changeset = diff(&current, &previous).unwrap();
        let amounts = changeset.settlement_amounts();

        assert_eq!(
            amounts.tokens,
            I256::from_dec_str("2000000000000000000").unwrap()
        );
        assert_eq!(
            amounts.mint_ids,
            vec![U256::from(ItemName::Sunflower.token_id())]
        );
        assert_eq!(amounts.mint_amounts, vec![U256::from(3u64)]);
        assert_eq!(amounts.burn_ids, vec![U256::from(ItemName::Wood.token_id())]);
        assert_eq!(
            amounts.burn_amounts,
            vec![U256::from_dec_str("3000000000000000000").unwrap()]
        );
    }

    #[test]
    fn item_absent_from_one_side_still_diffs() {
        let previous = snapshot(Decimal::ZERO, &[]);
        let current = snapshot(Decimal::ZERO, &[(ItemName::Scarecrow, 1)]);
        let changeset = diff(&current, &previous).unwrap();
        assert_eq!(
            changeset.inventory.get(&ItemName::Scarecrow),
            Some(&I256::from(1))
        );

        let reverse = diff(&previous, &current).unwrap();
        assert_eq!(
            reverse.inventory.get(&ItemName::Scarecrow),
            Some(&I256::from(-1))
        );
    }

    proptest! {
        #[test]
        fn balance_delta_is_additive(
            a in 0i64..1_000_000,
            b in 0i64..1_000_000,
            c in 0i64..1_000_000,
        ) {
            let sa = snapshot(Decimal::new(a, 2), &[]);
            let sb = snapshot(Decimal::new(b, 2), &[]);
            let sc = snapshot(Decimal::new(c, 2), &[]);

            let ab = diff(&sa, &sb).unwrap().balance;
            let bc = diff(&sb, &sc).unwrap().balance;
            let ac = diff(&sa, &sc).unwrap().balance;
            prop_assert_eq!(ab + bc, ac);
        }

        #[test]
        fn inventory_delta_is_additive(
            a in 0i64..100_000,
            b in 0i64..100_000,
            c in 0i64..100_000,
        ) {
            let item = ItemName::Sunflower;
            let zero = I256::zero();
            let sa = snapshot(Decimal::ZERO, &[(item, a)]);
            let sb = snapshot(Decimal::ZERO, &[(item, b)]);
            let sc = snapshot(Decimal::ZERO, &[(item, c)]);

            let ab = diff(&sa, &sb).unwrap().inventory.get(&item).copied().unwrap_or(zero);
            let bc = diff(&sb, &sc).unwrap().inventory.get(&item).copied().unwrap_or(zero);
            let ac = diff(&sa, &sc).unwrap().inventory.get(&item).copied().unwrap_or(zero);
            prop_assert_eq!(ab + bc, ac);
        }
    }
}
