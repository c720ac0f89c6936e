use async_trait::async_trait;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, H256, U256};
use std::sync::Arc;

use crate::{
    config::Config,
    error::{AppError, Result},
};

ethers::contract::abigen!(
    FarmRegistry,
    r#"[
        function ownerOf(uint256) view returns (address)
        function accountOf(uint256) view returns (address)
    ]"#
);

ethers::contract::abigen!(
    SunseedToken,
    r#"[
        function balanceOf(address) view returns (uint256)
    ]"#
);

ethers::contract::abigen!(
    SunseedInventory,
    r#"[
        function balanceOfBatch(address[], uint256[]) view returns (uint256[])
        function remainingSupply(uint256) view returns (uint256)
    ]"#
);

/// Read-only view of on-chain truth. The contracts are a black box; only
/// these calls are ever issued.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn owner_of(&self, farm_id: u64) -> Result<Address>;

    /// The settlement account holding a farm's token and item balances.
    async fn account_of(&self, farm_id: u64) -> Result<Address>;

    async fn balance_of(&self, account: Address) -> Result<U256>;

    /// Balances for `ids`, returned in the same order.
    async fn inventory_of(&self, account: Address, ids: &[U256]) -> Result<Vec<U256>>;

    async fn remaining_supply(&self, id: U256) -> Result<U256>;
}

pub struct EthersChainReader {
    farms: FarmRegistry<Provider<Http>>,
    token: SunseedToken<Provider<Http>>,
    inventory: SunseedInventory<Provider<Http>>,
}

impl EthersChainReader {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.ethereum_rpc_url.as_str())
            .map_err(|e| AppError::Internal(format!("Invalid RPC URL: {}", e)))?;
        let client = Arc::new(provider);

        Ok(Self {
            farms: FarmRegistry::new(parse_address(&config.farm_registry_address)?, client.clone()),
            token: SunseedToken::new(parse_address(&config.token_address)?, client.clone()),
            inventory: SunseedInventory::new(parse_address(&config.inventory_address)?, client),
        })
    }
}

#[async_trait]
impl ChainReader for EthersChainReader {
    async fn owner_of(&self, farm_id: u64) -> Result<Address> {
        self.farms
            .owner_of(U256::from(farm_id))
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    async fn account_of(&self, farm_id: u64) -> Result<Address> {
        self.farms
            .account_of(U256::from(farm_id))
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    async fn balance_of(&self, account: Address) -> Result<U256> {
        self.token
            .balance_of(account)
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    async fn inventory_of(&self, account: Address, ids: &[U256]) -> Result<Vec<U256>> {
        let accounts = vec![account; ids.len()];
        self.inventory
            .balance_of_batch(accounts, ids.to_vec())
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    async fn remaining_supply(&self, id: U256) -> Result<U256> {
        self.inventory
            .remaining_supply(id)
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }
}

pub fn parse_address(value: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| AppError::BadRequest(format!("Invalid address: {value}")))
}

/// Session ids are opaque on-chain nonces, carried as 0x-prefixed bytes32.
pub fn parse_session_id(value: &str) -> Result<H256> {
    value
        .trim()
        .parse::<H256>()
        .map_err(|_| AppError::BadRequest(format!("Invalid session id: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_accepts_checksummed_hex() {
        let parsed = parse_address("0x1111111111111111111111111111111111111111").unwrap();
        assert_eq!(parsed, Address::repeat_byte(0x11));
    }

    #[test]
    fn parse_address_rejects_garbage() {
        assert!(parse_address("gm fren").is_err());
        assert!(parse_address("0x1234").is_err());
    }

    #[test]
    fn parse_session_id_requires_bytes32() {
        let ok = parse_session_id(
            "0x00000000000000000000000000000000000000000000000000000000000000aa",
        );
        assert!(ok.is_ok());
        assert!(parse_session_id("0xaa").is_err());
    }
}
