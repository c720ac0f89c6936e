use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Blockchain
    pub ethereum_rpc_url: String,

    // Contract Addresses
    pub farm_registry_address: String,
    pub token_address: String,
    pub inventory_address: String,

    // Remote signing authority
    pub signer_url: String,
    pub signer_api_key: Option<String>,

    // CAPTCHA
    pub captcha_verify_url: String,
    pub captcha_secret: String,

    // Legacy migration lookup
    pub migration_api_url: Option<String>,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            ethereum_rpc_url: env::var("ETHEREUM_RPC_URL")?,

            farm_registry_address: env::var("FARM_REGISTRY_ADDRESS")?,
            token_address: env::var("TOKEN_ADDRESS")?,
            inventory_address: env::var("INVENTORY_ADDRESS")?,

            signer_url: env::var("SIGNER_URL")?,
            signer_api_key: env::var("SIGNER_API_KEY").ok(),

            captcha_verify_url: env::var("CAPTCHA_VERIFY_URL")
                .unwrap_or_else(|_| "https://www.google.com/recaptcha/api/siteverify".to_string()),
            captcha_secret: env::var("CAPTCHA_SECRET")?,

            migration_api_url: env::var("MIGRATION_API_URL").ok(),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.ethereum_rpc_url.trim().is_empty() {
            anyhow::bail!("ETHEREUM_RPC_URL is empty");
        }
        if self.signer_url.trim().is_empty() {
            anyhow::bail!("SIGNER_URL is empty");
        }
        if self.captcha_secret.trim().is_empty() {
            anyhow::bail!("CAPTCHA_SECRET is empty");
        }

        for (name, address) in [
            ("farm registry", &self.farm_registry_address),
            ("token", &self.token_address),
            ("inventory", &self.inventory_address),
        ] {
            if !address.starts_with("0x") || address.len() != 42 {
                anyhow::bail!("Invalid {} contract address: {}", name, address);
            }
            if address.starts_with("0x0000") {
                tracing::warn!("Using placeholder {} contract address", name);
            }
        }

        if self.migration_api_url.is_none() {
            tracing::warn!("MIGRATION_API_URL not set; legacy snapshots disabled");
        }

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        self.environment == "development" || self.environment == "testnet"
    }
}
