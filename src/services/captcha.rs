use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::Config,
    error::{AppError, Result},
};

/// External CAPTCHA challenge verifier. A failed challenge is a normal
/// outcome, not an error; errors mean the verifier itself was unreachable.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<bool>;
}

pub struct RecaptchaClient {
    http: reqwest::Client,
    url: String,
    secret: String,
}

#[derive(Deserialize)]
struct CaptchaResponse {
    success: bool,
}

impl RecaptchaClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.captcha_verify_url.clone(),
            secret: config.captcha_secret.clone(),
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaClient {
    async fn verify(&self, token: &str) -> Result<bool> {
        let response = self
            .http
            .post(&self.url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("CAPTCHA verifier unreachable: {}", e)))?;

        let body: CaptchaResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("CAPTCHA verifier response: {}", e)))?;
        Ok(body.success)
    }
}
