use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    config::Config,
    error::{AppError, Result},
    game::items::ItemName,
};

/// One-time balance and inventory carried over from the predecessor game,
/// looked up by wallet address. Applied at most once, when a farm record is
/// first created.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LegacySnapshot {
    pub balance: Decimal,
    #[serde(default)]
    pub inventory: BTreeMap<ItemName, Decimal>,
}

#[async_trait]
pub trait MigrationSource: Send + Sync {
    async fn snapshot_for(&self, address: &str) -> Result<Option<LegacySnapshot>>;
}

pub struct HttpMigrationSource {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl HttpMigrationSource {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config
                .migration_api_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
        }
    }
}

#[async_trait]
impl MigrationSource for HttpMigrationSource {
    async fn snapshot_for(&self, address: &str) -> Result<Option<LegacySnapshot>> {
        let Some(base_url) = &self.base_url else {
            return Ok(None);
        };

        let response = self
            .http
            .get(format!("{}/snapshots/{}", base_url, address))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Migration lookup failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Migration lookup returned {}",
                response.status()
            )));
        }

        let snapshot: LegacySnapshot = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Migration snapshot decode: {}", e)))?;
        Ok(Some(snapshot))
    }
}
