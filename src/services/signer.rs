use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, Result},
};

/// The remote signing authority holding the verifier-trusted key. Key
/// custody never enters this process; only digests go over the wire.
#[async_trait]
pub trait SettlementSigner: Send + Sync {
    /// Returns the 0x-prefixed signature over `digest`.
    async fn sign(&self, digest: [u8; 32]) -> Result<String>;
}

pub struct RemoteSigner {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct SignRequest<'a> {
    digest: &'a str,
}

#[derive(Deserialize)]
struct SignResponse {
    signature: String,
}

impl RemoteSigner {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.signer_url.trim_end_matches('/').to_string(),
            api_key: config.signer_api_key.clone(),
        }
    }
}

#[async_trait]
impl SettlementSigner for RemoteSigner {
    async fn sign(&self, digest: [u8; 32]) -> Result<String> {
        let digest_hex = format!("0x{}", hex::encode(digest));
        let mut request = self
            .http
            .post(format!("{}/sign", self.url))
            .json(&SignRequest {
                digest: &digest_hex,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Signer(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AppError::Signer(format!(
                "signer returned {}",
                response.status()
            )));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| AppError::Signer(e.to_string()))?;
        if !body.signature.starts_with("0x") {
            return Err(AppError::Signer("malformed signature".to_string()));
        }

        tracing::debug!("Remote signer produced signature for {}", digest_hex);
        Ok(body.signature)
    }
}
