use ethers::abi::Token;
use ethers::types::{Address, H256, U256};
use sha3::{Digest, Keccak256};

use crate::game::changeset::SettlementAmounts;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn keccak256_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(keccak256(data)))
}

/// The digest the sync verifier recomputes on-chain. Field order, types and
/// packing must match the contract byte for byte; everything funnels
/// through `ethers::abi::encode` so there is a single canonical layout.
pub fn sync_digest(
    session_id: H256,
    deadline: U256,
    sender: Address,
    farm_id: U256,
    amounts: &SettlementAmounts,
) -> [u8; 32] {
    let encoded = ethers::abi::encode(&[
        Token::FixedBytes(session_id.as_bytes().to_vec()),
        Token::Uint(deadline),
        Token::Address(sender),
        Token::Uint(farm_id),
        uint_array(&amounts.mint_ids),
        uint_array(&amounts.mint_amounts),
        uint_array(&amounts.burn_ids),
        uint_array(&amounts.burn_amounts),
        Token::Int(amounts.tokens.into_raw()),
    ]);
    keccak256(&encoded)
}

/// Withdraw shares the encoding machinery but carries an item list, the
/// requested SFL amount and the tiered tax rate instead of mint/burn sets.
#[allow(clippy::too_many_arguments)]
pub fn withdraw_digest(
    session_id: H256,
    deadline: U256,
    sender: Address,
    farm_id: U256,
    ids: &[U256],
    amounts: &[U256],
    sfl: U256,
    tax_bps: U256,
) -> [u8; 32] {
    let encoded = ethers::abi::encode(&[
        Token::FixedBytes(session_id.as_bytes().to_vec()),
        Token::Uint(deadline),
        Token::Address(sender),
        Token::Uint(farm_id),
        uint_array(ids),
        uint_array(amounts),
        Token::Uint(sfl),
        Token::Uint(tax_bps),
    ]);
    keccak256(&encoded)
}

fn uint_array(values: &[U256]) -> Token {
    Token::Array(values.iter().map(|value| Token::Uint(*value)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::I256;

    fn amounts() -> SettlementAmounts {
        SettlementAmounts {
            mint_ids: vec![U256::from(1u64), U256::from(301u64)],
            mint_amounts: vec![U256::from(3u64), U256::from(10u64).pow(U256::from(18u64))],
            burn_ids: vec![U256::from(101u64)],
            burn_amounts: vec![U256::from(2u64)],
            tokens: I256::from(-5),
        }
    }

    #[test]
    fn keccak256_hex_matches_empty_string_vector() {
        let digest = keccak256_hex(b"");
        assert_eq!(
            digest,
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn sync_digest_is_byte_identical_across_calls() {
        let session: H256 = "0x00000000000000000000000000000000000000000000000000000000000000aa"
            .parse()
            .unwrap();
        let sender: Address = "0x1111111111111111111111111111111111111111"
            .parse()
            .unwrap();

        let first = sync_digest(session, U256::from(1_700_000u64), sender, U256::from(42u64), &amounts());
        let second = sync_digest(session, U256::from(1_700_000u64), sender, U256::from(42u64), &amounts());
        assert_eq!(first, second);
    }

    #[test]
    fn sync_digest_is_sensitive_to_every_field() {
        let session: H256 = "0x00000000000000000000000000000000000000000000000000000000000000aa"
            .parse()
            .unwrap();
        let sender: Address = "0x1111111111111111111111111111111111111111"
            .parse()
            .unwrap();

        let base = sync_digest(session, U256::from(1u64), sender, U256::from(42u64), &amounts());

        let other_deadline =
            sync_digest(session, U256::from(2u64), sender, U256::from(42u64), &amounts());
        assert_ne!(base, other_deadline);

        let mut tweaked = amounts();
        tweaked.tokens = I256::from(5);
        let other_tokens =
            sync_digest(session, U256::from(1u64), sender, U256::from(42u64), &tweaked);
        assert_ne!(base, other_tokens);
    }

    #[test]
    fn withdraw_digest_differs_from_sync_digest() {
        let session: H256 = "0x00000000000000000000000000000000000000000000000000000000000000aa"
            .parse()
            .unwrap();
        let sender: Address = "0x1111111111111111111111111111111111111111"
            .parse()
            .unwrap();

        let sync = sync_digest(session, U256::from(1u64), sender, U256::from(42u64), &amounts());
        let withdraw = withdraw_digest(
            session,
            U256::from(1u64),
            sender,
            U256::from(42u64),
            &[U256::from(1u64)],
            &[U256::from(1u64)],
            U256::from(100u64),
            U256::from(3000u64),
        );
        assert_ne!(sync, withdraw);
    }
}
